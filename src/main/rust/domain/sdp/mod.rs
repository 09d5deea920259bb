pub mod canonicalizer;
mod offer_builder;
pub mod session_description;

pub use canonicalizer::{canonicalize_offer, has_application_section};
pub use offer_builder::TransportDescriptionBuilder;
pub use session_description::SessionDescription;
