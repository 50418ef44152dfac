// Share card text and share-intent URLs for a drawn result.
// Capturing the screen image is the host's job.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::GachaError;
use crate::types::GachaResult;

pub const SHARE_TITLE: &str = "ガチャカメラ";

const X_INTENT_URL: &str = "https://twitter.com/intent/tweet";
const LINE_SHARE_URL: &str = "https://social-plugins.line.me/lineit/share";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareCard {
    pub title: String,
    pub text: String,
    pub url: String,
    pub file_name: String,
}

impl ShareCard {
    /// Compose the card. The last serif line is quoted.
    pub fn for_result(result: &GachaResult, page_url: &str) -> Self {
        let character = &result.character;
        let mut text = format!(
            "【{}】\n{}の「{}」を引きました！",
            SHARE_TITLE, character.rarity, character.name
        );
        if let Some(last) = character.serifs.last() {
            text.push_str(&format!("\n「{}」", last));
        }

        ShareCard {
            title: SHARE_TITLE.to_string(),
            text,
            url: page_url.to_string(),
            file_name: "gacha-result.png".to_string(),
        }
    }

    /// X (Twitter) intent URL, used when the Web Share API is missing.
    pub fn x_intent_url(&self) -> Result<String, GachaError> {
        let url = Url::parse_with_params(
            X_INTENT_URL,
            &[("text", self.text.as_str()), ("url", self.url.as_str())],
        )
        .map_err(|e| GachaError::InvalidConfig(e.to_string()))?;
        Ok(url.into())
    }

    pub fn line_share_url(&self) -> Result<String, GachaError> {
        let url = Url::parse_with_params(
            LINE_SHARE_URL,
            &[("url", self.url.as_str()), ("text", self.text.as_str())],
        )
        .map_err(|e| GachaError::InvalidConfig(e.to_string()))?;
        Ok(url.into())
    }
}
