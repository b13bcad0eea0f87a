// Adapters layer: concrete implementations of the domain ports (shop HTTP, HTML, storage, mail).

pub mod html;
pub mod http;
pub mod mail;
pub mod pacing;
pub mod storage;
