//! Maps the content of `noscript` elements to `(category, label)` observations.
//!
//! Tags are dispatched by name to a [`TagKind`]; each kind owns an ordered
//! chain of [`Policy`] values. Policies are tried in order and the first one
//! producing a non-empty result wins. A tag whose name has no kind is
//! [`Classification::Unrecognized`], which is different from a known tag
//! that simply carries nothing of interest.

use std::collections::HashMap;

use tracing::warn;
use url::Url;

use crate::observation::Observation;
use crate::patterns::{self, contains_any, first_match};
use crate::tag::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Iframe,
    Style,
    Link,
    Picture,
    Meta,
    Anchor,
    Video,
    Img,
    Div,
    Text,
    Container,
    Paragraph,
    Noop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Iframe,
    Style,
    Link,
    Picture,
    Meta,
    Anchor,
    Video,
    Img,
    DivClass,
    Text,
    Container,
    Noop,
}

impl TagKind {
    pub fn policies(self) -> &'static [Policy] {
        match self {
            TagKind::Iframe => &[Policy::Iframe],
            TagKind::Style => &[Policy::Style],
            TagKind::Link => &[Policy::Link],
            TagKind::Picture => &[Policy::Picture],
            TagKind::Meta => &[Policy::Meta],
            TagKind::Anchor => &[Policy::Anchor],
            TagKind::Video => &[Policy::Video],
            TagKind::Img => &[Policy::Img],
            TagKind::Div => &[Policy::DivClass, Policy::Text, Policy::Container],
            TagKind::Text => &[Policy::Text],
            TagKind::Container => &[Policy::Container],
            TagKind::Paragraph => &[Policy::Text, Policy::Container],
            TagKind::Noop => &[Policy::Noop],
        }
    }
}

const TAG_KINDS: &[(&str, TagKind)] = &[
    ("iframe", TagKind::Iframe),
    ("style", TagKind::Style),
    ("link", TagKind::Link),
    ("picture", TagKind::Picture),
    ("meta", TagKind::Meta),
    ("a", TagKind::Anchor),
    ("video", TagKind::Video),
    ("div", TagKind::Div),
    ("img", TagKind::Img),
    ("br", TagKind::Noop),
    ("label", TagKind::Noop),
    ("h1", TagKind::Text),
    ("h2", TagKind::Text),
    ("h3", TagKind::Text),
    ("h4", TagKind::Text),
    ("h5", TagKind::Text),
    ("h6", TagKind::Text),
    ("em", TagKind::Text),
    ("strong", TagKind::Text),
    ("b", TagKind::Text),
    ("i", TagKind::Text),
    ("figcaption", TagKind::Text),
    ("form", TagKind::Text),
    ("p", TagKind::Paragraph),
    ("td", TagKind::Container),
    ("span", TagKind::Container),
];

/// Gate applied before the image size/alt/class heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImgGate {
    /// Historical behavior: the source authority is always a substring of
    /// the source itself, so every image passes the gate.
    #[default]
    Legacy,
    /// Only sources mentioning `static` or `cdn` pass.
    Strict,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierOptions {
    pub img_gate: ImgGate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// No handler is registered for the tag name.
    Unrecognized,
    Recognized(Vec<Observation>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedTag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl From<&Tag> for UnrecognizedTag {
    fn from(tag: &Tag) -> Self {
        Self {
            name: tag.name.clone(),
            attributes: tag.attributes.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoscriptScan {
    pub observations: Vec<Observation>,
    pub unrecognized: Vec<UnrecognizedTag>,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    kinds: HashMap<&'static str, TagKind>,
    options: ClassifierOptions,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifierOptions::default())
    }
}

impl Classifier {
    pub fn new(options: ClassifierOptions) -> Self {
        Self {
            kinds: TAG_KINDS.iter().copied().collect(),
            options,
        }
    }

    pub fn kind_of(&self, name: &str) -> Option<TagKind> {
        self.kinds.get(name).copied()
    }

    /// Classifies a single tag. Unrecognized descendants met while
    /// scanning containers are logged and skipped.
    pub fn classify(&self, tag: &Tag, page: &Url) -> Classification {
        let mut unrecognized = Vec::new();
        let classification = self.classify_into(tag, page, &mut unrecognized);
        report_unrecognized(&unrecognized, page);
        classification
    }

    /// Classifies every child of a `noscript` element.
    pub fn classify_noscript(&self, noscript: &Tag, page: &Url) -> NoscriptScan {
        let mut scan = NoscriptScan::default();

        if noscript.children.is_empty() {
            scan.observations.push(Observation::other("empty"));
            return scan;
        }

        for child in &noscript.children {
            match self.classify_into(child, page, &mut scan.unrecognized) {
                Classification::Recognized(observations) => scan.observations.extend(observations),
                Classification::Unrecognized => scan.unrecognized.push(child.into()),
            }
        }

        scan
    }

    fn classify_into(
        &self,
        tag: &Tag,
        page: &Url,
        unrecognized: &mut Vec<UnrecognizedTag>,
    ) -> Classification {
        let Some(kind) = self.kind_of(&tag.name) else {
            return Classification::Unrecognized;
        };

        for policy in kind.policies() {
            let observations = self.apply(*policy, tag, page, unrecognized);
            if !observations.is_empty() {
                return Classification::Recognized(observations);
            }
        }

        Classification::Recognized(Vec::new())
    }

    fn apply(
        &self,
        policy: Policy,
        tag: &Tag,
        page: &Url,
        unrecognized: &mut Vec<UnrecognizedTag>,
    ) -> Vec<Observation> {
        let found = match policy {
            Policy::Iframe => classify_iframe(tag),
            Policy::Style => Some(Observation::alternative("inline_style")),
            Policy::Link => classify_link(tag),
            Policy::Picture => Some(Observation::alternative("static_content")),
            Policy::Meta => Some(classify_meta(tag)),
            Policy::Anchor => Some(Observation::alternative("link")),
            Policy::Video => Some(Observation::alternative("video")),
            Policy::Img => self.classify_img(tag, page),
            Policy::DivClass => tag
                .attr("class")
                .and_then(|class| first_match(patterns::DIV_CLASSES, class)),
            Policy::Text => classify_text(tag),
            Policy::Noop => None,
            Policy::Container => return self.classify_children(tag, page, unrecognized),
        };
        found.into_iter().collect()
    }

    fn classify_children(
        &self,
        tag: &Tag,
        page: &Url,
        unrecognized: &mut Vec<UnrecognizedTag>,
    ) -> Vec<Observation> {
        let mut observations = Vec::new();
        for child in &tag.children {
            match self.classify_into(child, page, unrecognized) {
                Classification::Recognized(found) => observations.extend(found),
                Classification::Unrecognized => unrecognized.push(child.into()),
            }
        }
        observations
    }

    fn classify_img(&self, tag: &Tag, page: &Url) -> Option<Observation> {
        let static_content = Observation::alternative("static_content");

        if tag.attr("srcset").is_some() {
            let host = page.host_str().unwrap_or_default();
            if contains_any(host, patterns::SRCSET_HOSTS) {
                return Some(static_content);
            }
        }

        let src = tag.attr("src")?;

        if let Some(tracker) = first_match(patterns::IMG_TRACKERS, src) {
            return Some(tracker);
        }

        if is_root_relative(src) || contains_any(src, patterns::IMG_CONTENT_HOSTS) {
            return Some(static_content);
        }

        let authority = source_authority(src);
        if patterns::IMG_HOST_PREFIXES
            .iter()
            .any(|prefix| authority.starts_with(*prefix))
        {
            return Some(static_content);
        }

        let gated = match self.options.img_gate {
            ImgGate::Legacy => true,
            ImgGate::Strict => contains_any(&src.to_lowercase(), patterns::IMG_STATIC_HINTS),
        };
        if gated && looks_like_content_image(tag) {
            return Some(static_content);
        }

        None
    }
}

fn classify_iframe(tag: &Tag) -> Option<Observation> {
    let src = tag.attr("src")?;

    if let Some(tracker) = first_match(patterns::IFRAME_TRACKERS, src) {
        return Some(tracker);
    }

    is_root_relative(src).then_some(Observation::alternative("frame_content"))
}

fn classify_link(tag: &Tag) -> Option<Observation> {
    let rel = tag.attr("rel");

    if rel == Some("stylesheet") || tag.attr("type") == Some("text/css") {
        return Some(Observation::alternative("stylesheet"));
    }

    let preloads_font = rel == Some("preload")
        && tag
            .attr("href")
            .is_some_and(|href| contains_any(href, patterns::FONT_CDNS));

    preloads_font.then_some(Observation::alternative("stylesheet"))
}

fn classify_meta(tag: &Tag) -> Observation {
    match tag.attr("http-equiv") {
        Some(value) if value.eq_ignore_ascii_case("refresh") => Observation::other("refresh"),
        _ => Observation::other("meta_content"),
    }
}

fn classify_text(tag: &Tag) -> Option<Observation> {
    (!tag.text.trim().is_empty()).then_some(Observation::alternative("text"))
}

/// Alt text, a class, or a visible size mark an image as page content.
fn looks_like_content_image(tag: &Tag) -> bool {
    let non_blank = |name: &str| tag.attr(name).is_some_and(|v| !v.trim().is_empty());

    if non_blank("alt") || non_blank("class") {
        return true;
    }

    let dimension = |name: &str| tag.attr(name).and_then(|v| v.trim().parse::<u32>().ok());
    match (dimension("width"), dimension("height")) {
        (Some(width), Some(height)) => {
            width >= patterns::MIN_VISIBLE_IMG_SIZE && height >= patterns::MIN_VISIBLE_IMG_SIZE
        }
        _ => false,
    }
}

/// True for `/path` but not for protocol-relative `//host/path`.
pub fn is_root_relative(src: &str) -> bool {
    src.starts_with('/') && !src.starts_with("//")
}

/// Host part of an absolute or protocol-relative source, empty otherwise.
fn source_authority(src: &str) -> String {
    let parsed = if src.starts_with("//") {
        Url::parse(&format!("https:{}", src))
    } else {
        Url::parse(src)
    };

    parsed
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Logs every unrecognized tag of a scan against the page it came from.
pub fn report_unrecognized(unrecognized: &[UnrecognizedTag], page: &Url) {
    let host = page.host_str().unwrap_or_default();
    for tag in unrecognized {
        warn!(
            action = "classify",
            component = "classifier",
            host = host,
            tag = %tag.name,
            attributes = ?tag.attributes,
            "Unrecognized tag"
        );
    }
}
