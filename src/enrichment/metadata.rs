/// Off-chain token metadata: image URL and social links.
///
/// The migration event's `uri` either points straight at an image (used
/// as-is) or at a metadata JSON document carrying image and socials. The
/// JSON fetch only happens in full mode under a 3s cap.
use once_cell::sync::Lazy;
use serde_json::Value;
use std::time::Duration;

/// What the metadata pass recovered; all fields degrade to empty.
#[derive(Debug, Clone, Default)]
pub struct TokenMetaFetch {
    pub image: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
}

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg"];
const IMAGE_HOSTS: &[&str] = &["ipfs.io", "arweave.net", "cf-ipfs.com", "pump.mypinata.cloud"];

static HTTP: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .unwrap_or_default()
});

/// True when the URI can be used directly as an image source.
pub fn is_direct_image(uri: &str) -> bool {
    let lower = uri.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        || IMAGE_HOSTS.iter().any(|host| lower.contains(host))
}

pub async fn fetch(uri: Option<&str>) -> TokenMetaFetch {
    let uri = match uri {
        Some(uri) if !uri.trim().is_empty() => uri,
        _ => return TokenMetaFetch::default(),
    };

    if is_direct_image(uri) {
        return TokenMetaFetch {
            image: Some(uri.to_string()),
            ..TokenMetaFetch::default()
        };
    }

    let body = match HTTP.get(uri).send().await {
        Ok(response) if response.status().is_success() => {
            match response.json::<Value>().await {
                Ok(body) => body,
                Err(_) => return TokenMetaFetch::default(),
            }
        }
        _ => return TokenMetaFetch::default(),
    };

    parse_metadata(&body)
}

/// Pull image and socials out of a pump.fun-style metadata document.
pub fn parse_metadata(body: &Value) -> TokenMetaFetch {
    let field = |key: &str| {
        body.get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    TokenMetaFetch {
        image: field("image"),
        twitter: field("twitter"),
        telegram: field("telegram"),
        website: field("website"),
        description: field("description"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_image_detection() {
        assert!(is_direct_image("https://cdn.example/logo.PNG"));
        assert!(is_direct_image("https://ipfs.io/ipfs/Qm123"));
        assert!(!is_direct_image("https://example.com/meta.json"));
    }

    #[test]
    fn test_parse_metadata() {
        let body = json!({
            "name": "Example",
            "image": "https://ipfs.io/ipfs/Qm456",
            "twitter": "https://x.com/example",
            "website": "  https://example.com  ",
            "description": ""
        });
        let meta = parse_metadata(&body);
        assert_eq!(meta.image.as_deref(), Some("https://ipfs.io/ipfs/Qm456"));
        assert_eq!(meta.twitter.as_deref(), Some("https://x.com/example"));
        assert_eq!(meta.website.as_deref(), Some("https://example.com"));
        assert!(meta.telegram.is_none());
        assert!(meta.description.is_none());
    }
}
