use crate::geometry::Size;
use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    Deref,
    From,
    Into,
    AsRef,
)]
#[serde(transparent)]
pub struct ImageSource(String);

crate::impl_string_newtype!(ImageSource);

#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    Deref,
    From,
    Into,
    AsRef,
)]
#[serde(transparent)]
pub struct Caption(String);

crate::impl_string_newtype!(Caption);

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ImageEntry {
    pub src: ImageSource,
    #[serde(default)]
    pub caption: Caption,
}

impl ImageEntry {
    pub fn new(src: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            src: ImageSource::new(src),
            caption: Caption::new(caption),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Card {
    pub index: usize,
    pub entry: ImageEntry,
    /// Pixel size of the decoded image, once the host knows it.
    pub natural_size: Option<Size>,
}

impl Card {
    /// Size of the image's layout box inside a card of `card` size.
    pub fn image_size(&self, card: Size) -> Size {
        self.natural_size
            .map(|natural| natural.fit_within(card))
            .unwrap_or(card)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GalleryError {
    #[error("gallery has no images")]
    Empty,
    #[error("card index {index} out of range for {count} cards")]
    OutOfRange { index: usize, count: usize },
}

pub fn build_cards(entries: &[ImageEntry]) -> Result<Vec<Card>, GalleryError> {
    if entries.is_empty() {
        return Err(GalleryError::Empty);
    }

    Ok(entries
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, entry)| Card {
            index,
            entry,
            natural_size: None,
        })
        .collect())
}
