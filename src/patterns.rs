//! Signature tables for recognizing trackers and static content.
//!
//! Every table is matched by plain substring search, in order, first hit
//! wins. Order matters where needles overlap (e.g. `2O7.net` omniture pixels
//! vs. the rakuten subdomain).

use crate::observation::Observation;

/// A vendor signature: any needle found in the haystack yields `observation`.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub needles: &'static [&'static str],
    pub observation: Observation,
}

impl Signature {
    const fn tracking(needles: &'static [&'static str], label: &'static str) -> Self {
        Self {
            needles,
            observation: Observation::tracking(label),
        }
    }

    const fn alternative(needles: &'static [&'static str], label: &'static str) -> Self {
        Self {
            needles,
            observation: Observation::alternative(label),
        }
    }

    pub fn matches(&self, haystack: &str) -> bool {
        contains_any(haystack, self.needles)
    }
}

/// First signature of `table` that matches `haystack`.
pub fn first_match(table: &[Signature], haystack: &str) -> Option<Observation> {
    table
        .iter()
        .find(|signature| signature.matches(haystack))
        .map(|signature| signature.observation)
}

pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

pub const IFRAME_TRACKERS: &[Signature] = &[
    Signature::tracking(&["googletagmanager.com"], "google_tag_manager"),
    Signature::tracking(&["google-analytics.com"], "google_analytics"),
    Signature::tracking(&["fls.doubleclick.net"], "doubleclick"),
    Signature::tracking(&["thebrighttag.com"], "the_bright_tag"),
];

/// Font CDNs whose preloaded stylesheets count as styling.
pub const FONT_CDNS: &[&str] = &["fonts.googleapis.com"];

pub const DIV_CLASSES: &[Signature] = &[
    Signature::tracking(&["statcounter"], "statcounter"),
    // WebMD
    Signature::alternative(&["global-footer-certificates"], "static_content"),
    // BBC
    Signature::alternative(&["top-story__image"], "static_content"),
    // eBay
    Signature::alternative(&["hl-image"], "static_content"),
];

/// Only shopify storefronts emit `srcset` images inside noscript.
pub const SRCSET_HOSTS: &[&str] = &["shopify.com"];

pub const IMG_TRACKERS: &[Signature] = &[
    Signature::tracking(&["b.scorecardresearch.com"], "scorecard_research"),
    Signature::tracking(&["facebook.com/tr"], "facebook"),
    Signature::tracking(&["ct.pinterest.com"], "pinterest"),
    Signature::tracking(&["imrworldwide.com"], "imr_worldwide"),
    Signature::tracking(
        &["googleadservices.com/pagead/conversion"],
        "google_ad_conversion",
    ),
    Signature::tracking(&["ads.linkedin.com/collect"], "linkedin"),
    Signature::tracking(&["web.vortex.data.microsoft.com"], "microsoft"),
    Signature::tracking(&["tns-counter.ru"], "tns_counter"),
    Signature::tracking(&["pixel.quantserve.com"], "quantcast"),
    Signature::tracking(&["analytics.twitter.com", "t.co/i/adsct"], "twitter"),
    Signature::tracking(&["rrss.abc.es/pixel"], "abc_es"),
    Signature::tracking(&["adform.net/Serving/TrackPoint"], "adform"),
    Signature::tracking(&["bat.bing.com"], "bing"),
    Signature::tracking(&["doubleclick.net/pagead", "ad.doubleclick.net"], "doubleclick"),
    Signature::tracking(&["google-analytics.com"], "google_analytics"),
    Signature::tracking(&["quora.com/_/ad"], "quora"),
    Signature::tracking(&["fls-na.amazon.com"], "amazon"),
    Signature::tracking(&["ssc.api.bbc.com", "api.bbc.co.uk"], "bbc"),
    Signature::tracking(&["anon-stats.eff.org"], "eff"),
    Signature::tracking(&["trc.taboola.com"], "taboola"),
    Signature::tracking(&["pixel.wp.com"], "wordpress"),
    Signature::tracking(&["bizographics.com/collect"], "bizographics"),
    Signature::tracking(&["pixiedust.buzzfeed.com"], "buzzfeed"),
    Signature::tracking(&["smetrics.el-mundo.net"], "el_mundo"),
    Signature::tracking(&["zdbb.net/l"], "ziff_davis"),
    Signature::tracking(&["phar.gu-web.net"], "the_guardian"),
    Signature::tracking(&["smetrics.timeout.com"], "timeout"),
    Signature::tracking(&["cloudfront.net/atrk.gif"], "amazon_cloudfront"),
    Signature::tracking(&["counter.rambler.ru"], "rambler"),
    Signature::tracking(&["mc.yandex.ru", "yabs.yandex.ru"], "yandex"),
    Signature::tracking(&["r3.mail.ru", "mail.ru/counter"], "mail_ru"),
    Signature::tracking(&["xiti.com"], "xiti"),
    Signature::tracking(&["analytics.archive.org"], "archive"),
    Signature::tracking(&["ft.com/px.gif"], "financial_times"),
    Signature::tracking(&["omtrdc.net"], "adobe_digital_marketing"),
    Signature::tracking(&["2o7.net", "2O7.net"], "omniture"),
    Signature::tracking(
        &[
            "analytics.ietf.org",
            "athena.iubenda.com/js",
            "piwik.itzbund.de",
        ],
        "matomo_piwik",
    ),
    Signature::tracking(&["saffron.760main.com/oll"], "offerlogic"),
    Signature::tracking(&["rakuten.112.2O7.net"], "rakuten"),
    Signature::tracking(&["alexametrics.com/atrk.gif"], "alexa"),
    Signature::tracking(&["pixel.spotify.com"], "spotify"),
];

/// Hosts and path fragments that only ever serve page content.
pub const IMG_CONTENT_HOSTS: &[&str] = &[
    "i.ytimg.com",                     // youtube thumbnails
    "s.w-x.co",                        // wetter.de
    "googleusercontent.com",
    "images.arcpublishing.com",
    "cloudfront.net/thumbnails",
    "wp-content/uploads",
    "imageserver/image",               // times uk
    "images/thumb",
    "springernature.com/springer-cms",
    "imagesvc.meredithcorp.io",
    "cdn.vox-cdn.com",
    "cdni.rt.com",
    "www.theglobeandmail.com/resizer",
];

/// Authority prefixes of dedicated image hosts.
pub const IMG_HOST_PREFIXES: &[&str] = &["cdn", "img"];

/// Source fragments that hint at a content image in the fallback heuristic.
pub const IMG_STATIC_HINTS: &[&str] = &["static", "cdn"];

/// Minimum edge length, in pixels, of a visible image.
pub const MIN_VISIBLE_IMG_SIZE: u32 = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_respects_table_order() {
        assert_eq!(
            first_match(IMG_TRACKERS, "https://rakuten.112.2O7.net/b/ss/x"),
            Some(Observation::tracking("omniture"))
        );
        assert_eq!(
            first_match(IMG_TRACKERS, "https://www.facebook.com/tr?id=1&ev=PageView"),
            Some(Observation::tracking("facebook"))
        );
        assert_eq!(first_match(IMG_TRACKERS, "https://example.com/a.png"), None);
    }

    #[test]
    fn test_signature_any_needle() {
        assert_eq!(
            first_match(IMG_TRACKERS, "https://t.co/i/adsct?p_id=1"),
            Some(Observation::tracking("twitter"))
        );
        assert_eq!(
            first_match(IMG_TRACKERS, "https://yabs.yandex.ru/count"),
            Some(Observation::tracking("yandex"))
        );
    }
}
