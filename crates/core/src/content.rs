//! Content and media gallery rules: kinds, publication states, slugs, and
//! video provider detection.

/// Long-form text entry.
pub const KIND_ARTICLE: &str = "article";
/// Photo gallery.
pub const KIND_GALLERY: &str = "gallery";
/// Video collection.
pub const KIND_VIDEO: &str = "video";

/// All valid content kinds.
pub const VALID_KINDS: &[&str] = &[KIND_ARTICLE, KIND_GALLERY, KIND_VIDEO];

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_ARCHIVED: &str = "archived";

/// All valid content statuses.
pub const VALID_STATUSES: &[&str] = &[STATUS_DRAFT, STATUS_PUBLISHED, STATUS_ARCHIVED];

pub const PROVIDER_YOUTUBE: &str = "youtube";
pub const PROVIDER_VIMEO: &str = "vimeo";
pub const PROVIDER_OTHER: &str = "other";

/// Maximum slug length generated by [`slugify`].
pub const SLUG_MAX_LEN: usize = 80;

/// Validate that a content kind is one of the accepted values.
pub fn validate_kind(kind: &str) -> Result<(), String> {
    if VALID_KINDS.contains(&kind) {
        Ok(())
    } else {
        Err(format!(
            "Invalid content kind '{kind}'. Must be one of: {}",
            VALID_KINDS.join(", ")
        ))
    }
}

/// Validate that a content status is one of the accepted values.
pub fn validate_status(status: &str) -> Result<(), String> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid content status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        ))
    }
}

/// Derive a URL slug from a title.
///
/// Lowercases ASCII letters, strips common Latin diacritics, collapses runs of
/// any other characters into a single `-`, and trims dashes at both ends.
/// Returns `None` when nothing usable remains.
pub fn slugify(title: &str) -> Option<String> {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.chars() {
        let mapped = fold_diacritic(ch).to_ascii_lowercase();
        if mapped.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(mapped);
        } else {
            pending_dash = true;
        }
    }

    if slug.len() > SLUG_MAX_LEN {
        slug.truncate(SLUG_MAX_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

fn fold_diacritic(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'Á' | 'À' | 'Ä' | 'Â' | 'Ã' => 'a',
        'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' | 'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => 'u',
        'ñ' | 'Ñ' => 'n',
        'ç' | 'Ç' => 'c',
        other => other,
    }
}

/// Classify a video URL by hosting provider.
pub fn detect_video_provider(url: &str) -> &'static str {
    let host = url
        .split("://")
        .nth(1)
        .unwrap_or(url)
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    match host {
        "youtube.com" | "m.youtube.com" | "youtu.be" => PROVIDER_YOUTUBE,
        "vimeo.com" | "player.vimeo.com" => PROVIDER_VIMEO,
        _ => PROVIDER_OTHER,
    }
}
