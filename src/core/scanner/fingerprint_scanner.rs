// src/core/scanner/fingerprint_scanner.rs

use crate::core::collectors::http::HttpResponse;
use crate::core::knowledge_base::{get_finding_detail, known_cves};
use crate::core::models::{Severity, TechnologySignal, VulnerabilityFinding};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use tracing::{debug, error, info};

/// The four places evidence for a technology can be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    /// The raw page markup.
    Html,
    /// `src` attributes of `<script>` tags.
    Script,
    /// A response header's value, looked up by lowercase name.
    Header,
    /// The `content` of a `<meta>` tag, looked up by `name`.
    Meta,
}

impl Channel {
    fn weight(self) -> u32 {
        match self {
            Channel::Html => 30,
            Channel::Script => 25,
            Channel::Header => 40,
            Channel::Meta => 35,
        }
    }
}

/// One piece of evidence as written in the signature table.
enum Evidence {
    Html(&'static str),
    Script(&'static str),
    Header(&'static str, &'static str),
    Meta(&'static str, &'static str),
}

impl Evidence {
    fn parts(&self) -> (Channel, Option<&'static str>, &'static str) {
        match self {
            Evidence::Html(p) => (Channel::Html, None, *p),
            Evidence::Script(p) => (Channel::Script, None, *p),
            Evidence::Header(name, p) => (Channel::Header, Some(*name), *p),
            Evidence::Meta(name, p) => (Channel::Meta, Some(*name), *p),
        }
    }
}

/// A named technology and every rule that can reveal it.
struct Signature {
    name: &'static str,
    category: &'static str,
    rules: &'static [Evidence],
}

/// The master list of technology signatures. Within a signature, rules with
/// a version capture come first so the version is taken from the most
/// specific evidence.
static SIGNATURES: &[Signature] = &[
    // --- Web servers ---
    Signature { name: "Nginx", category: "Web Server", rules: &[
        Evidence::Header("server", r"(?i)nginx(?:/([\d.]+))?"),
        Evidence::Html(r"<center>nginx(?:/[\d.]+)?</center>"),
    ] },
    Signature { name: "Apache", category: "Web Server", rules: &[
        Evidence::Header("server", r"Apache(?:/([\d.]+))?"),
        Evidence::Html(r"Apache(?:/[\d.]+)? Server at"),
    ] },
    Signature { name: "Microsoft IIS", category: "Web Server", rules: &[
        Evidence::Header("server", r"Microsoft-IIS(?:/([\d.]+))?"),
    ] },
    Signature { name: "LiteSpeed", category: "Web Server", rules: &[
        Evidence::Header("server", r"(?i)litespeed"),
    ] },
    Signature { name: "Caddy", category: "Web Server", rules: &[
        Evidence::Header("server", r"(?i)^caddy"),
    ] },

    // --- CDN / WAF ---
    Signature { name: "Cloudflare", category: "CDN / WAF", rules: &[
        Evidence::Header("server", r"(?i)cloudflare"),
        Evidence::Header("cf-ray", r".+"),
    ] },
    Signature { name: "Sucuri", category: "WAF", rules: &[
        Evidence::Header("x-sucuri-id", r".+"),
        Evidence::Header("server", r"(?i)sucuri"),
    ] },
    Signature { name: "Imperva Incapsula", category: "WAF", rules: &[
        Evidence::Header("x-iinfo", r".+"),
        Evidence::Header("set-cookie", r"(?i)incap_ses|visid_incap"),
    ] },
    Signature { name: "Akamai", category: "CDN / WAF", rules: &[
        Evidence::Header("server", r"(?i)akamaighost"),
        Evidence::Header("x-akamai-transformed", r".+"),
    ] },
    Signature { name: "Amazon CloudFront", category: "CDN", rules: &[
        Evidence::Header("via", r"(?i)cloudfront"),
        Evidence::Header("x-amz-cf-id", r".+"),
    ] },
    Signature { name: "F5 BIG-IP", category: "WAF", rules: &[
        Evidence::Header("set-cookie", r"BIGipServer"),
        Evidence::Header("server", r"(?i)big-?ip"),
    ] },
    Signature { name: "Fastly", category: "CDN", rules: &[
        Evidence::Header("x-fastly-request-id", r".+"),
        Evidence::Header("x-served-by", r"cache-[a-z0-9-]+"),
    ] },
    Signature { name: "Vercel", category: "Hosting", rules: &[
        Evidence::Header("server", r"(?i)vercel"),
        Evidence::Header("x-vercel-id", r".+"),
    ] },
    Signature { name: "Netlify", category: "Hosting", rules: &[
        Evidence::Header("server", r"(?i)netlify"),
    ] },

    // --- CMS / e-commerce ---
    Signature { name: "WordPress", category: "CMS", rules: &[
        Evidence::Meta("generator", r"WordPress ?([\d.]+)?"),
        Evidence::Html(r"/wp-content/|/wp-includes/"),
        Evidence::Script(r"/wp-(?:content|includes)/"),
    ] },
    Signature { name: "Joomla", category: "CMS", rules: &[
        Evidence::Meta("generator", r"Joomla!? ?([\d.]+)?"),
        Evidence::Html(r"/media/jui/|/components/com_"),
    ] },
    Signature { name: "Drupal", category: "CMS", rules: &[
        Evidence::Meta("generator", r"Drupal ?([\d.]+)?"),
        Evidence::Header("x-generator", r"(?i)drupal ?([\d.]+)?"),
        Evidence::Script(r"/sites/(?:default|all)/|drupal\.js"),
    ] },
    Signature { name: "Wix", category: "Website Builder", rules: &[
        Evidence::Meta("generator", r"(?i)wix\.com"),
        Evidence::Header("x-wix-request-id", r".+"),
    ] },
    Signature { name: "Shopify", category: "E-commerce", rules: &[
        Evidence::Header("x-shopid", r".+"),
        Evidence::Script(r"cdn\.shopify\.com"),
    ] },
    Signature { name: "Magento", category: "E-commerce", rules: &[
        Evidence::Header("set-cookie", r"(?i)\bfrontend=|mage-"),
        Evidence::Script(r"/static/version\d+/frontend/|/mage/"),
    ] },

    // --- Languages / backend frameworks ---
    Signature { name: "PHP", category: "Language", rules: &[
        Evidence::Header("x-powered-by", r"PHP(?:/([\d.]+))?"),
        Evidence::Header("set-cookie", r"PHPSESSID"),
    ] },
    Signature { name: "ASP.NET", category: "Framework", rules: &[
        Evidence::Header("x-aspnet-version", r"([\d.]+)"),
        Evidence::Header("x-powered-by", r"ASP\.NET"),
        Evidence::Header("set-cookie", r"ASP\.NET_SessionId"),
    ] },
    Signature { name: "Java", category: "Language", rules: &[
        Evidence::Header("set-cookie", r"JSESSIONID"),
    ] },
    Signature { name: "Express", category: "Framework", rules: &[
        Evidence::Header("x-powered-by", r"(?i)^express"),
    ] },
    Signature { name: "Django", category: "Framework", rules: &[
        Evidence::Header("set-cookie", r"csrftoken"),
        Evidence::Html(r"csrfmiddlewaretoken"),
    ] },
    Signature { name: "Ruby on Rails", category: "Framework", rules: &[
        Evidence::Header("set-cookie", r"_rails_session|_session_id"),
        Evidence::Meta("csrf-param", r"authenticity_token"),
    ] },
    Signature { name: "Laravel", category: "Framework", rules: &[
        Evidence::Header("set-cookie", r"laravel_session|XSRF-TOKEN"),
    ] },

    // --- JavaScript frameworks ---
    Signature { name: "Next.js", category: "JS Framework", rules: &[
        Evidence::Header("x-powered-by", r"Next\.js ?([\d.]+)?"),
        Evidence::Script(r"/_next/static/"),
        Evidence::Html(r"__NEXT_DATA__"),
    ] },
    Signature { name: "Nuxt.js", category: "JS Framework", rules: &[
        Evidence::Html(r"__NUXT__|data-n-head"),
        Evidence::Script(r"/_nuxt/"),
    ] },
    Signature { name: "Gatsby", category: "JS Framework", rules: &[
        Evidence::Meta("generator", r"Gatsby ?([\d.]+)?"),
        Evidence::Html(r#"id="___gatsby""#),
    ] },
    Signature { name: "Angular", category: "JS Framework", rules: &[
        Evidence::Html(r#"ng-version="([\d.]+)""#),
    ] },
    Signature { name: "AngularJS", category: "JS Framework", rules: &[
        Evidence::Script(r"(?i)angularjs/([\d.]+)/angular"),
        Evidence::Script(r"(?i)angular(?:\.min)?\.js"),
        Evidence::Html(r"\bng-app\b"),
    ] },
    Signature { name: "React", category: "JS Library", rules: &[
        Evidence::Script(r"(?i)react(?:-dom)?@([\d.]+)"),
        Evidence::Html(r"data-reactroot|data-reactid"),
        Evidence::Script(r"(?i)react(?:-dom)?(?:\.production|\.development)?(?:\.min)?\.js"),
    ] },
    Signature { name: "Vue.js", category: "JS Framework", rules: &[
        Evidence::Script(r"(?i)vue@([\d.]+)"),
        Evidence::Html(r"data-v-app|data-v-[0-9a-f]{8}"),
        Evidence::Script(r"(?i)vue(?:\.runtime)?(?:\.global)?(?:\.prod|\.min)?\.js"),
    ] },
    Signature { name: "Svelte", category: "JS Framework", rules: &[
        Evidence::Html(r#"class="[^"]*svelte-[a-z0-9]+"#),
    ] },
    Signature { name: "Astro", category: "JS Framework", rules: &[
        Evidence::Meta("generator", r"Astro v([\d.]+)"),
        Evidence::Html(r"<astro-island"),
    ] },

    // --- JavaScript libraries ---
    Signature { name: "jQuery", category: "JS Library", rules: &[
        Evidence::Script(r"(?i)jquery[.-]?(\d+\.\d+(?:\.\d+)?)(?:\.slim)?(?:\.min)?\.js"),
        Evidence::Script(r"(?i)jquery/(\d+\.\d+(?:\.\d+)?)/jquery"),
        Evidence::Html(r"jQuery v(\d+\.\d+(?:\.\d+)?)"),
        Evidence::Script(r"(?i)jquery(?:\.slim)?(?:\.min)?\.js"),
    ] },
    Signature { name: "Bootstrap", category: "UI Framework", rules: &[
        Evidence::Script(r"(?i)bootstrap(?:@|/)(\d+\.\d+(?:\.\d+)?)"),
        Evidence::Html(r"bootstrap(?:\.min)?\.css"),
        Evidence::Script(r"(?i)bootstrap(?:\.bundle)?(?:\.min)?\.js"),
    ] },
    Signature { name: "Lodash", category: "JS Library", rules: &[
        Evidence::Script(r"(?i)lodash(?:@|/|\.js/)(\d+\.\d+(?:\.\d+)?)"),
        Evidence::Script(r"(?i)lodash(?:\.min)?\.js"),
    ] },
    Signature { name: "Moment.js", category: "JS Library", rules: &[
        Evidence::Script(r"(?i)moment(?:@|/|\.js/)(\d+\.\d+(?:\.\d+)?)"),
        Evidence::Script(r"(?i)moment(?:-with-locales)?(?:\.min)?\.js"),
    ] },
    Signature { name: "Handlebars", category: "JS Library", rules: &[
        Evidence::Script(r"(?i)handlebars(?:@|/|\.js/)(\d+\.\d+(?:\.\d+)?)"),
        Evidence::Script(r"(?i)handlebars(?:\.runtime)?(?:\.min)?\.js"),
    ] },
    Signature { name: "Font Awesome", category: "UI Framework", rules: &[
        Evidence::Html(r"font-?awesome(?:\.min)?\.css"),
        Evidence::Script(r"kit\.fontawesome\.com"),
    ] },

    // --- Analytics & third-party services ---
    Signature { name: "Google Analytics", category: "Analytics", rules: &[
        Evidence::Script(r"google-analytics\.com/|googletagmanager\.com/gtag"),
        Evidence::Html(r"ga\('create'|gtag\('config'"),
    ] },
    Signature { name: "Google Tag Manager", category: "Tag Manager", rules: &[
        Evidence::Script(r"googletagmanager\.com/gtm\.js"),
        Evidence::Html(r"GTM-[A-Z0-9]{4,}"),
    ] },
    Signature { name: "Hotjar", category: "Analytics", rules: &[
        Evidence::Script(r"static\.hotjar\.com"),
        Evidence::Html(r"hjid\s*:"),
    ] },
    Signature { name: "reCAPTCHA", category: "Security", rules: &[
        Evidence::Script(r"google\.com/recaptcha|recaptcha/api\.js"),
    ] },
];

struct CompiledRule {
    channel: Channel,
    key: Option<&'static str>,
    pattern: Regex,
}

struct CompiledSignature {
    name: &'static str,
    category: &'static str,
    rules: Vec<CompiledRule>,
}

/// Signatures with their patterns compiled once. A pattern that fails to
/// compile is dropped with an error log; the rest of its signature survives.
static REGISTRY: Lazy<Vec<CompiledSignature>> = Lazy::new(|| {
    SIGNATURES
        .iter()
        .map(|signature| CompiledSignature {
            name: signature.name,
            category: signature.category,
            rules: signature
                .rules
                .iter()
                .filter_map(|evidence| {
                    let (channel, key, source) = evidence.parts();
                    match Regex::new(source) {
                        Ok(pattern) => Some(CompiledRule { channel, key, pattern }),
                        Err(e) => {
                            error!(tech = signature.name, pattern = source, error = %e, "Invalid fingerprint pattern.");
                            None
                        }
                    }
                })
                .collect(),
        })
        .collect()
});

static SCRIPT_SELECTOR: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("script[src]").ok());
static META_SELECTOR: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("meta[name][content]").ok());

/// The parts of a page the rules look at, extracted once per page.
struct PageEvidence<'a> {
    body: &'a str,
    headers: &'a HashMap<String, String>,
    scripts: Vec<String>,
    /// Lowercased meta `name` to `content`. The first tag with a name wins.
    metas: HashMap<String, String>,
}

impl<'a> PageEvidence<'a> {
    fn extract(page: &'a HttpResponse) -> Self {
        let document = Html::parse_document(&page.body);

        let scripts = SCRIPT_SELECTOR
            .as_ref()
            .map(|selector| {
                document
                    .select(selector)
                    .filter_map(|el| el.value().attr("src"))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let mut metas = HashMap::new();
        if let Some(selector) = META_SELECTOR.as_ref() {
            for el in document.select(selector) {
                if let (Some(name), Some(content)) = (el.value().attr("name"), el.value().attr("content")) {
                    metas.entry(name.to_ascii_lowercase()).or_insert_with(|| content.to_string());
                }
            }
        }

        Self { body: &page.body, headers: &page.headers, scripts, metas }
    }

    /// Returns `Some(capture)` if the rule matched. The capture is the first
    /// non-empty capturing group, when the pattern has one.
    fn apply(&self, rule: &CompiledRule) -> Option<Option<String>> {
        match rule.channel {
            Channel::Html => capture(&rule.pattern, self.body),
            Channel::Script => self.scripts.iter().find_map(|src| capture(&rule.pattern, src)),
            Channel::Header => rule
                .key
                .and_then(|name| self.headers.get(name))
                .and_then(|value| capture(&rule.pattern, value)),
            Channel::Meta => rule
                .key
                .and_then(|name| self.metas.get(name))
                .and_then(|content| capture(&rule.pattern, content)),
        }
    }
}

fn capture(pattern: &Regex, text: &str) -> Option<Option<String>> {
    pattern.captures(text).map(|caps| {
        caps.iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str().to_string())
            .find(|s| !s.is_empty())
    })
}

/// Scores every signature against a fetched page.
///
/// Confidence adds up the weight of every matching rule (markup 30, script
/// 25, header 40, meta 35) and is clamped to 100. The version comes from the
/// first matching rule that captured one.
///
/// # Arguments
/// * `page` - The homepage response. Relay responses carry no headers, so
///   only the markup channels can match for them.
///
/// # Returns
/// Every technology with a confidence above zero, highest first, ties
/// broken by name.
pub fn detect_technologies(page: &HttpResponse) -> Vec<TechnologySignal> {
    let evidence = PageEvidence::extract(page);
    debug!(signatures = REGISTRY.len(), scripts = evidence.scripts.len(), "Applying fingerprint signatures.");

    let mut signals: Vec<TechnologySignal> = REGISTRY
        .iter()
        .filter_map(|signature| {
            let mut score = 0u32;
            let mut version = None;
            for rule in &signature.rules {
                if let Some(captured) = evidence.apply(rule) {
                    score += rule.channel.weight();
                    if version.is_none() {
                        version = captured;
                    }
                }
            }
            (score > 0).then(|| {
                debug!(tech = signature.name, score, version = ?version, "Signature matched.");
                TechnologySignal {
                    name: signature.name.to_string(),
                    category: signature.category.to_string(),
                    confidence: score.min(100) as u8,
                    version,
                }
            })
        })
        .collect();

    signals.sort_by(|a, b| b.confidence.cmp(&a.confidence).then_with(|| a.name.cmp(&b.name)));
    info!(count = signals.len(), "Technology detection finished.");
    signals
}

/// Turns detected versions into HIGH findings using the known-CVE table.
/// One finding per affected technology, targeted at `target`.
pub fn known_cve_findings(
    technologies: &[TechnologySignal],
    target: &str,
    timestamp: DateTime<Utc>,
) -> Vec<VulnerabilityFinding> {
    let Some(template) = get_finding_detail("vulnerable-component") else {
        return Vec::new();
    };

    technologies
        .iter()
        .filter_map(|tech| {
            let version = tech.version.as_deref()?;
            let cves = known_cves(&tech.name, version);
            if cves.is_empty() {
                return None;
            }
            let slug: String = tech
                .name
                .to_lowercase()
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
                .collect();
            Some(VulnerabilityFinding {
                id: format!("known-cve-{slug}"),
                name: format!("{} {} With Known CVEs", tech.name, version),
                severity: Severity::High,
                category: template.category.to_string(),
                target: target.to_string(),
                description: format!("{} {} is affected by {}. {}", tech.name, version, cves.join(", "), template.description),
                remediation: template.remediation.to_string(),
                evidence: Some(cves.join(", ")),
                timestamp,
            })
        })
        .collect()
}
