//! Stateless path and user-agent classification.
//!
//! Categorizes request paths (static asset / API / page) and matches the
//! signature lists used by the detectors: sensitive paths that indicate
//! enumeration, expensive operations, browser auto-fetched resources, and
//! automation tokens in user-agent strings. All patterns are compiled once
//! at construction and shared for the process lifetime.

use regex::Regex;

/// Coarse category of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Non-executing front-end resource (css/js/images/fonts, infra paths)
    StaticAsset,
    /// Anything under `/api/`
    Api,
    /// Everything else
    Page,
}

/// Precompiled pattern set for path and user-agent classification.
pub struct PathClassifier {
    static_asset: Regex,
    infra_path: Regex,
    sensitive: Regex,
    expensive: Regex,
    auto_fetched: Regex,
    automation_agent: Regex,
}

impl PathClassifier {
    pub fn new() -> Self {
        Self {
            static_asset: Regex::new(
                r"(?i)\.(css|js|mjs|map|png|jpe?g|gif|svg|ico|webp|avif|woff2?|ttf|eot|otf|pdf)$",
            )
            .expect("valid static asset pattern"),
            infra_path: Regex::new(
                r"(?i)^/(favicon\.ico|robots\.txt|manifest\.json|service-worker\.js|sw\.js|apple-touch-icon[^/]*|assets/|static/)",
            )
            .expect("valid infrastructure path pattern"),
            sensitive: Regex::new(
                r"(?i)(\.env|\.git|\.htaccess|\.ssh|id_rsa|wp-admin|wp-login|wp-content|phpmyadmin|administrator|admin|config|backup|dump\.sql)",
            )
            .expect("valid sensitive signature pattern"),
            expensive: Regex::new(r"(?i)(search|report|export|download|upload)")
                .expect("valid expensive operation pattern"),
            auto_fetched: Regex::new(
                r"(?i)(favicon\.ico|robots\.txt|manifest\.json|service-worker|sw\.js|apple-touch-icon|browserconfig\.xml)",
            )
            .expect("valid auto-fetched resource pattern"),
            automation_agent: Regex::new(
                r"(?i)(bot|crawl|spider|scan|scrape|curl|wget|python|java|go-http|libwww|headless|phantom|selenium|httpclient)",
            )
            .expect("valid automation token pattern"),
        }
    }

    /// Categorize a path as static asset, API call, or page.
    pub fn classify(&self, path: &str) -> PathClass {
        if self.static_asset.is_match(path) || self.infra_path.is_match(path) {
            PathClass::StaticAsset
        } else if path.starts_with("/api/") {
            PathClass::Api
        } else {
            PathClass::Page
        }
    }

    /// True when the path carries an enumeration/scanning signature.
    ///
    /// This is a strong signal on its own, independent of request rate.
    pub fn is_sensitive(&self, path: &str) -> bool {
        self.sensitive.is_match(path)
    }

    /// True when the path names an expensive server-side operation.
    pub fn is_expensive(&self, path: &str) -> bool {
        self.expensive.is_match(path)
    }

    /// True for resources browsers request on their own during a page load.
    pub fn is_auto_fetched(&self, path: &str) -> bool {
        self.auto_fetched.is_match(path)
    }

    /// True when a user-agent string carries a known automation token.
    pub fn is_automation_agent(&self, user_agent: &str) -> bool {
        self.automation_agent.is_match(user_agent)
    }
}

impl Default for PathClassifier {
    fn default() -> Self {
        Self::new()
    }
}
