//! Link classification
//!
//! Every link found on a page goes through an ordered rule list. The first
//! rule that applies decides the outcome; the order is part of the contract
//! (an external image is an image, not an external link).

use crate::state::CrawlResult;
use crate::url::domain::host_key;
use crate::url::normalize::is_absolute_http;
use crate::UrlError;
use serde::Serialize;
use std::fmt;
use url::Url;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp"];
const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "ts", "jsx", "tsx"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc"];

/// Result bucket for a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// In-scope page address
    Link,
    /// Absolute address on another site
    ExternalLink,
    /// Image resource
    Image,
    /// Script resource
    Script,
    /// `tel:` reference (stored without the prefix)
    Telephone,
    /// `mailto:` reference (stored without the prefix)
    Email,
    /// Downloadable document
    File,
}

impl Bucket {
    /// All buckets, in export order
    pub const ALL: [Bucket; 7] = [
        Bucket::Link,
        Bucket::ExternalLink,
        Bucket::Image,
        Bucket::Script,
        Bucket::Telephone,
        Bucket::Email,
        Bucket::File,
    ];

    /// Section name used by exporters (`links`, `images`, ...)
    pub fn section(&self) -> &'static str {
        match self {
            Self::Link => "links",
            Self::ExternalLink => "external_links",
            Self::Image => "images",
            Self::Script => "scripts",
            Self::Telephone => "telephones",
            Self::Email => "emails",
            Self::File => "files",
        }
    }

    /// Singular element name used by exporters (`link`, `image`, ...)
    pub fn element(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::ExternalLink => "external_link",
            Self::Image => "image",
            Self::Script => "script",
            Self::Telephone => "telephone",
            Self::Email => "email",
            Self::File => "file",
        }
    }

    /// The value stored for a raw link in this bucket
    pub fn stored_value(&self, link: &str) -> String {
        let link = link.trim();
        let value = match self {
            Self::Telephone => strip_prefix_ignore_case(link, "tel:"),
            Self::Email => strip_prefix_ignore_case(link, "mailto:"),
            _ => link,
        };
        value.to_string()
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.section())
    }
}

/// Outcome of classifying a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Dropped without being recorded (empty or fragment-bearing)
    Skip,
    /// Excluded from the frontier and recorded into a bucket
    Excluded(Bucket),
    /// Crawlable; resolve and enqueue
    InScope,
}

/// What a rule gets to look at
struct Candidate<'a> {
    link: &'a str,
    extension: Option<String>,
    base_host: &'a str,
}

struct Rule {
    name: &'static str,
    applies: fn(&Candidate<'_>) -> bool,
    verdict: Verdict,
}

const RULES: &[Rule] = &[
    Rule {
        name: "empty",
        applies: is_empty,
        verdict: Verdict::Skip,
    },
    Rule {
        name: "fragment",
        applies: has_fragment,
        verdict: Verdict::Skip,
    },
    Rule {
        name: "image",
        applies: is_image,
        verdict: Verdict::Excluded(Bucket::Image),
    },
    Rule {
        name: "script",
        applies: is_script,
        verdict: Verdict::Excluded(Bucket::Script),
    },
    Rule {
        name: "external",
        applies: is_external,
        verdict: Verdict::Excluded(Bucket::ExternalLink),
    },
    Rule {
        name: "telephone",
        applies: is_telephone,
        verdict: Verdict::Excluded(Bucket::Telephone),
    },
    Rule {
        name: "email",
        applies: is_email,
        verdict: Verdict::Excluded(Bucket::Email),
    },
    Rule {
        name: "document",
        applies: is_document,
        verdict: Verdict::Excluded(Bucket::File),
    },
];

fn is_empty(c: &Candidate<'_>) -> bool {
    c.link.is_empty()
}

fn has_fragment(c: &Candidate<'_>) -> bool {
    c.link.contains('#')
}

fn is_image(c: &Candidate<'_>) -> bool {
    has_extension(c, IMAGE_EXTENSIONS)
}

fn is_script(c: &Candidate<'_>) -> bool {
    has_extension(c, SCRIPT_EXTENSIONS)
}

fn is_external(c: &Candidate<'_>) -> bool {
    is_absolute_http(c.link) && host_key(c.link).as_deref() != Some(c.base_host)
}

fn is_telephone(c: &Candidate<'_>) -> bool {
    starts_with_ignore_case(c.link, "tel:")
}

fn is_email(c: &Candidate<'_>) -> bool {
    starts_with_ignore_case(c.link, "mailto:")
}

fn is_document(c: &Candidate<'_>) -> bool {
    has_extension(c, DOCUMENT_EXTENSIONS)
}

/// Decides whether links belong to the crawl
///
/// The classifier is bound to the host key of the seed address; absolute
/// links on any other host (including other subdomains) are external.
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    base_host: String,
}

impl LinkClassifier {
    /// Creates a classifier scoped to the site of `seed`
    ///
    /// # Returns
    ///
    /// * `Ok(LinkClassifier)` - Classifier bound to the seed's host key
    /// * `Err(UrlError)` - The seed has no host
    pub fn new(seed: &str) -> Result<Self, UrlError> {
        let base_host = host_key(seed).ok_or(UrlError::MissingDomain)?;
        Ok(Self { base_host })
    }

    /// The host key every in-scope link must share
    pub fn base_host(&self) -> &str {
        &self.base_host
    }

    /// Classifies a raw link; the first matching rule wins
    ///
    /// # Examples
    ///
    /// ```
    /// use torcrawl::url::{Bucket, LinkClassifier, Verdict};
    ///
    /// let classifier = LinkClassifier::new("https://torcrawl.com").unwrap();
    /// assert_eq!(classifier.classify("/about"), Verdict::InScope);
    /// assert_eq!(
    ///     classifier.classify("https://other.com/pic.png"),
    ///     Verdict::Excluded(Bucket::Image)
    /// );
    /// ```
    pub fn classify(&self, link: &str) -> Verdict {
        let link = link.trim();
        let candidate = Candidate {
            link,
            extension: path_extension(link),
            base_host: &self.base_host,
        };

        RULES
            .iter()
            .find(|rule| (rule.applies)(&candidate))
            .map(|rule| {
                tracing::trace!("Link {} matched rule '{}'", link, rule.name);
                rule.verdict
            })
            .unwrap_or(Verdict::InScope)
    }

    /// Classifies a link and records excluded ones into `result`
    ///
    /// Excluded values are stored under `source` once per run; a value seen
    /// again (by dedup key) is not stored a second time.
    ///
    /// # Returns
    ///
    /// * `true` - The link must not enter the frontier
    /// * `false` - The link is in scope
    pub fn excludes(&self, link: &str, source: &str, result: &mut CrawlResult) -> bool {
        match self.classify(link) {
            Verdict::Skip => true,
            Verdict::Excluded(bucket) => {
                result.record_resource(bucket, source, &bucket.stored_value(link));
                true
            }
            Verdict::InScope => false,
        }
    }

    /// Returns true if an absolute address shares the crawl's host key
    pub fn in_scope(&self, address: &str) -> bool {
        host_key(address).as_deref() == Some(self.base_host.as_str())
    }
}

/// Lowercased extension of the last path segment, query and fragment removed
fn path_extension(link: &str) -> Option<String> {
    let path = match Url::parse(link) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => link.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    let segment = path.rsplit('/').next()?;
    let (_, extension) = segment.rsplit_once('.')?;
    Some(extension.to_ascii_lowercase())
}

fn has_extension(candidate: &Candidate<'_>, set: &[&str]) -> bool {
    candidate
        .extension
        .as_deref()
        .map_or(false, |ext| set.contains(&ext))
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value.len() >= prefix.len()
        && value.is_char_boundary(prefix.len())
        && value[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> &'a str {
    if starts_with_ignore_case(value, prefix) {
        &value[prefix.len()..]
    } else {
        value
    }
}
