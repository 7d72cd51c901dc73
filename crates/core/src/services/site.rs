//! Site route table and sitemap.

use aac_common::{AppError, AppResult};
use serde::Serialize;

use super::i18n::{Language, Translator};

/// A page of the public site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Route path.
    pub path: &'static str,
    /// Translation key of the page title.
    pub title_key: &'static str,
    /// Whether the page requires an admin session.
    pub restricted: bool,
    /// Whether the page is listed in the public sitemap.
    pub listed: bool,
    /// Sub-sections listed under the page, as `(path, title_key)`.
    pub sections: &'static [(&'static str, &'static str)],
}

const fn page(path: &'static str, title_key: &'static str) -> Page {
    Page {
        path,
        title_key,
        restricted: false,
        listed: true,
        sections: &[],
    }
}

/// Every route of the site.
pub const PAGES: &[Page] = &[
    page("/", "nav.home"),
    Page {
        sections: &[
            ("/products?category=optics", "products.optics"),
            ("/products?category=systems", "products.systems"),
            ("/products?category=components", "products.components"),
        ],
        ..page("/products", "nav.products")
    },
    page("/about", "nav.about"),
    page("/news", "nav.news"),
    page("/contact", "nav.contact"),
    page("/careers", "nav.careers"),
    page("/sitemap", "nav.sitemap"),
    Page {
        listed: false,
        ..page("/auth", "nav.auth")
    },
    Page {
        restricted: true,
        listed: false,
        ..page("/admin", "nav.admin")
    },
];

/// A page with its localized title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub path: String,
    pub title: String,
    pub restricted: bool,
}

/// A sitemap entry with its localized title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitemapEntry {
    pub path: String,
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SitemapEntry>,
}

/// Find the page serving `path`. Query strings and trailing slashes are ignored.
pub fn resolve(path: &str) -> AppResult<&'static Page> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    let normalized = if trimmed.is_empty() { "/" } else { trimmed };

    PAGES
        .iter()
        .find(|page| page.path == normalized)
        .ok_or_else(|| AppError::NotFound(format!("No page at {path}")))
}

/// Render a page for `lang`.
#[must_use]
pub fn page_view(page: &Page, translator: &Translator, lang: Language) -> PageView {
    PageView {
        path: page.path.to_string(),
        title: translator.t(lang, page.title_key).to_string(),
        restricted: page.restricted,
    }
}

/// The public sitemap for `lang`.
#[must_use]
pub fn sitemap(translator: &Translator, lang: Language) -> Vec<SitemapEntry> {
    PAGES
        .iter()
        .filter(|page| page.listed && !page.restricted)
        .map(|page| SitemapEntry {
            path: page.path.to_string(),
            title: translator.t(lang, page.title_key).to_string(),
            children: page
                .sections
                .iter()
                .map(|(path, key)| SitemapEntry {
                    path: (*path).to_string(),
                    title: translator.t(lang, key).to_string(),
                    children: Vec::new(),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_pages() {
        assert_eq!(resolve("/").unwrap().title_key, "nav.home");
        assert_eq!(resolve("").unwrap().path, "/");
        assert_eq!(resolve("/news/").unwrap().path, "/news");
        assert_eq!(resolve("/products?category=optics").unwrap().path, "/products");
        assert!(resolve("/admin").unwrap().restricted);
    }

    #[test]
    fn test_resolve_unknown_is_not_found() {
        assert!(matches!(resolve("/nope"), Err(AppError::NotFound(_))));
        assert!(matches!(resolve("/news/extra"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_sitemap_excludes_admin_and_auth() {
        let translator = Translator::load().unwrap();
        let entries = sitemap(&translator, Language::En);
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();

        assert_eq!(
            paths,
            ["/", "/products", "/about", "/news", "/contact", "/careers", "/sitemap"]
        );
        assert_eq!(entries[1].children.len(), 3);
        assert_eq!(entries[0].title, "Home");
    }

    #[test]
    fn test_sitemap_is_localized() {
        let translator = Translator::load().unwrap();
        let zh = sitemap(&translator, Language::Zh);
        let ja = sitemap(&translator, Language::Ja);
        assert_eq!(zh[0].title, "首页");
        assert_ne!(zh[0].title, ja[0].title);
        // No Japanese entry for careers: English fallback
        assert_eq!(ja[5].title, "Careers");
    }
}
