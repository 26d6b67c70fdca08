use expensor_recognize::PageImage;

/// One submitted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFile {
    pub name: String,
    pub media: Media,
}

/// Multi-page documents arrive already expanded to page images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Media {
    Image(PageImage),
    Document { pages: Vec<PageImage> },
}

impl BatchFile {
    pub fn image(name: impl Into<String>, page: PageImage) -> Self {
        Self {
            name: name.into(),
            media: Media::Image(page),
        }
    }

    pub fn document(name: impl Into<String>, pages: Vec<PageImage>) -> Self {
        Self {
            name: name.into(),
            media: Media::Document { pages },
        }
    }

    pub fn pages(&self) -> &[PageImage] {
        match &self.media {
            Media::Image(page) => std::slice::from_ref(page),
            Media::Document { pages } => pages,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages().len()
    }
}
