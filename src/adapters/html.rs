use crate::domain::model::{Candidate, CandidateBatch, Item, SubmissionPayload};
use crate::utils::error::{BasketError, Result};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CSS selectors describing the shop's product list markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    pub item: String,
    pub title: String,
    pub author: String,
    pub price: String,
    pub form_inputs: String,
    pub non_book_markers: Vec<String>,
    pub checkout_form: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            item: ".mx-product-list-item".to_string(),
            title: ".mx-product-list-item-title".to_string(),
            author: ".mx-product-list-item-manufacturer-link".to_string(),
            price: ".mx-product-list-item-price".to_string(),
            form_inputs: "form input".to_string(),
            non_book_markers: ["audiobook", "music", "game", "movie"]
                .iter()
                .map(|kind| format!(".sprite-icon-{}", kind))
                .collect(),
            checkout_form: "form[data-ga-label=\"Paypal Express\"]".to_string(),
        }
    }
}

impl PageLayout {
    pub fn compile(&self) -> Result<CompiledLayout> {
        Ok(CompiledLayout {
            item: parse_selector("layout.item", &self.item)?,
            title: parse_selector("layout.title", &self.title)?,
            author: parse_selector("layout.author", &self.author)?,
            price: parse_selector("layout.price", &self.price)?,
            form_inputs: parse_selector("layout.form_inputs", &self.form_inputs)?,
            non_book_markers: self
                .non_book_markers
                .iter()
                .map(|s| parse_selector("layout.non_book_markers", s))
                .collect::<Result<_>>()?,
            checkout_form: parse_selector("layout.checkout_form", &self.checkout_form)?,
            inputs: parse_selector("layout.inputs", "input")?,
        })
    }
}

fn parse_selector(field: &str, selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| BasketError::InvalidConfigValue {
        field: field.to_string(),
        value: selector.to_string(),
        reason: format!("Invalid CSS selector: {}", e),
    })
}

#[derive(Debug, Clone)]
pub struct CompiledLayout {
    item: Selector,
    title: Selector,
    author: Selector,
    price: Selector,
    form_inputs: Selector,
    non_book_markers: Vec<Selector>,
    checkout_form: Selector,
    inputs: Selector,
}

#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("unparsable price {0:?}")]
    InvalidPrice(String),
}

/// Decodes every product on a page. Products that fail to decode are dropped.
pub fn decode_page(html: &str, layout: &CompiledLayout) -> CandidateBatch {
    let document = Html::parse_document(html);
    let mut candidates = Vec::new();

    for element in document.select(&layout.item) {
        match decode_item(element, layout) {
            Ok(Some(candidate)) => candidates.push(candidate),
            Ok(None) => {}
            Err(e) => tracing::debug!("Dropping product entry: {}", e),
        }
    }

    CandidateBatch::from_candidates(candidates)
}

/// `Ok(None)` means the entry is not a book.
pub fn decode_item(
    element: ElementRef<'_>,
    layout: &CompiledLayout,
) -> std::result::Result<Option<Candidate>, DecodeError> {
    let title = first_text(element, &layout.title).ok_or(DecodeError::MissingField("title"))?;
    let author = first_text(element, &layout.author).ok_or(DecodeError::MissingField("author"))?;

    if layout
        .non_book_markers
        .iter()
        .any(|marker| element.select(marker).next().is_some())
    {
        tracing::info!("Skip non book {} by {}", title, author);
        return Ok(None);
    }

    let price_text = first_text(element, &layout.price).ok_or(DecodeError::MissingField("price"))?;
    let price = parse_price(&price_text)?;

    let fields = element
        .select(&layout.form_inputs)
        .filter_map(|input| {
            let input = input.value();
            Some((input.attr("name")?.to_string(), input.attr("value")?.to_string()))
        })
        .collect();

    Ok(Some(Candidate::new(
        Item::new(title, author),
        price,
        SubmissionPayload::new(fields),
    )))
}

/// Parses shop prices such as `"3,49 €"`.
pub fn parse_price(text: &str) -> std::result::Result<f64, DecodeError> {
    let amount = text
        .split_whitespace()
        .next()
        .ok_or_else(|| DecodeError::InvalidPrice(text.to_string()))?;

    match amount.replace(',', ".").parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(DecodeError::InvalidPrice(text.to_string())),
    }
}

fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let text: String = element.select(selector).next()?.text().collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// A form to re-post: its action and the inputs that carry a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSpec {
    pub action: String,
    pub fields: Vec<(String, String)>,
}

pub fn find_checkout_form(html: &str, layout: &CompiledLayout) -> Option<FormSpec> {
    let document = Html::parse_document(html);
    let form = document.select(&layout.checkout_form).next()?;
    let action = form.value().attr("action")?.to_string();

    let fields = form
        .select(&layout.inputs)
        .filter_map(|input| {
            let input = input.value();
            let value = input.attr("value").filter(|v| !v.is_empty())?;
            Some((input.attr("name")?.to_string(), value.to_string()))
        })
        .collect();

    Some(FormSpec { action, fields })
}
