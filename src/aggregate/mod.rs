//! Chronological and category aggregation of posts
//!
//! Both indexes borrow the collected pages and are rebuilt on every build.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::content::Page;
use crate::error::{BuildError, Result};

/// URL slug used when a category name slugifies to nothing
pub const FALLBACK_CATEGORY_SLUG: &str = "uncategorized";

/// Posts of one category, in site index order
#[derive(Debug, Clone)]
pub struct Category<'a> {
    pub name: String,
    /// URL-safe form of `name`
    pub slug: String,
    pub posts: Vec<&'a Page>,
}

/// Derived indexes over the post set
#[derive(Debug, Default)]
pub struct Aggregates<'a> {
    /// All posts, newest first; ties broken by slug
    pub site_index: Vec<&'a Page>,
    /// Categories keyed by name
    pub categories: BTreeMap<String, Category<'a>>,
}

impl<'a> Aggregates<'a> {
    pub fn category(&self, name: &str) -> Option<&Category<'a>> {
        self.categories.get(name)
    }
}

/// Site index order: date descending, then slug ascending
pub fn index_order(a: &Page, b: &Page) -> Ordering {
    b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug))
}

/// URL slug of a category name
pub fn category_slug(name: &str) -> String {
    let slug = slug::slugify(name);
    if slug.is_empty() {
        FALLBACK_CATEGORY_SLUG.to_string()
    } else {
        slug
    }
}

/// Build the site index and category index from a set of posts.
///
/// Static pages passed in by mistake are skipped.
pub fn aggregate(posts: &[Page]) -> Result<Aggregates<'_>> {
    let mut site_index: Vec<&Page> = posts.iter().filter(|p| p.is_post()).collect();
    site_index.sort_by(|a, b| index_order(a, b));

    let mut categories: BTreeMap<String, Category> = BTreeMap::new();
    for post in &site_index {
        for name in &post.categories {
            categories
                .entry(name.clone())
                .or_insert_with(|| Category {
                    name: name.clone(),
                    slug: category_slug(name),
                    posts: Vec::new(),
                })
                .posts
                .push(*post);
        }
    }

    let mut slugs: BTreeMap<&str, &str> = BTreeMap::new();
    for category in categories.values() {
        if let Some(first) = slugs.insert(&category.slug, &category.name) {
            return Err(BuildError::DuplicateSlug {
                slug: format!("category/{}", category.slug),
                first: format!("category `{}`", first),
                second: format!("category `{}`", category.name),
            });
        }
    }

    tracing::debug!(
        "Aggregated {} posts into {} categories",
        site_index.len(),
        categories.len()
    );

    Ok(Aggregates {
        site_index,
        categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FrontMatter;

    fn post(slug: &str, date: &str, categories: &str) -> Page {
        let mut fm = FrontMatter::default();
        fm.insert("title", slug.to_uppercase());
        fm.insert("date", date);
        fm.insert("categories", categories);
        Page::from_front_matter(&fm, slug, "").unwrap()
    }

    fn slugs(pages: &[&Page]) -> Vec<String> {
        pages.iter().map(|p| p.slug.clone()).collect()
    }

    #[test]
    fn test_two_post_example() {
        let posts = vec![post("b", "2024-01-01", "x, y"), post("a", "2024-01-02", "x")];
        let agg = aggregate(&posts).unwrap();

        assert_eq!(slugs(&agg.site_index), vec!["a", "b"]);
        assert_eq!(slugs(&agg.category("x").unwrap().posts), vec!["a", "b"]);
        assert_eq!(slugs(&agg.category("y").unwrap().posts), vec!["b"]);
        assert_eq!(agg.categories.len(), 2);
    }

    #[test]
    fn test_ties_sorted_by_slug() {
        let posts = vec![
            post("zeta", "2024-05-05", ""),
            post("alpha", "2024-05-05", ""),
            post("mid", "2024-05-05", ""),
            post("old", "2020-01-01", ""),
        ];
        let agg = aggregate(&posts).unwrap();
        assert_eq!(slugs(&agg.site_index), vec!["alpha", "mid", "zeta", "old"]);
        for pair in agg.site_index.windows(2) {
            assert_ne!(index_order(pair[0], pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn test_category_members_follow_site_index() {
        let posts = vec![
            post("p1", "2024-01-01", "rust"),
            post("p2", "2024-03-01", "web, rust"),
            post("p3", "2024-02-01", "web"),
            post("p4", "2024-04-01", ""),
        ];
        let agg = aggregate(&posts).unwrap();

        for category in agg.categories.values() {
            let expected: Vec<&Page> = agg
                .site_index
                .iter()
                .copied()
                .filter(|p| p.categories.contains(&category.name))
                .collect();
            assert_eq!(slugs(&category.posts), slugs(&expected));
        }
        assert_eq!(slugs(&agg.category("rust").unwrap().posts), vec!["p2", "p1"]);
        assert!(agg.categories.values().all(|c| !c.posts.is_empty()));
    }

    #[test]
    fn test_static_pages_are_not_aggregated() {
        let mut fm = FrontMatter::default();
        fm.insert("title", "About");
        fm.insert("page", "true");
        fm.insert("categories", "x");
        let about = Page::from_front_matter(&fm, "about", "").unwrap();

        let posts = vec![about, post("a", "2024-01-01", "")];
        let agg = aggregate(&posts).unwrap();
        assert_eq!(slugs(&agg.site_index), vec!["a"]);
        assert!(agg.categories.is_empty());
    }

    #[test]
    fn test_category_slugs() {
        assert_eq!(category_slug("Rust Lang"), "rust-lang");
        assert_eq!(category_slug("???"), FALLBACK_CATEGORY_SLUG);
    }

    #[test]
    fn test_colliding_category_slugs() {
        let posts = vec![post("a", "2024-01-01", "c++, c!!")];
        // Both names collapse to `c`
        let err = aggregate(&posts).unwrap_err();
        assert!(matches!(err, BuildError::DuplicateSlug { .. }));
    }
}
