use futures::future::BoxFuture;

use super::ServiceError;
use crate::persist::SavedImage;

/// Descriptive analysis of a bitmap, used to enrich saved-board records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageAnalysis {
    pub caption: Option<String>,
    pub tags: Vec<String>,
    pub accent_color: Option<String>,
}

/// Produces tags, a caption, and dominant colors for bitmap bytes.
pub trait ImageTagger: Send + Sync {
    fn analyze(&self, png: Vec<u8>) -> BoxFuture<'static, Result<ImageAnalysis, ServiceError>>;
}

/// Folds an analysis into a saved-board record.
pub fn enrich(record: &mut SavedImage, analysis: &ImageAnalysis) {
    record.desc = Some(
        analysis
            .caption
            .clone()
            .unwrap_or_else(|| "No Description".to_owned()),
    );
    if !analysis.tags.is_empty() {
        record.tags = Some(analysis.tags.clone());
    }
    record.color = analysis.accent_color.clone();
}
