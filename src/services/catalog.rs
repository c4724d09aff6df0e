use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::{
    error::AppResult,
    models::{Item, ItemId, YearRange},
};

/// Row of the poster table
#[derive(Debug, Deserialize)]
struct PosterRow {
    title: String,
    #[serde(default)]
    poster_link: String,
}

/// Ordered collection of movies, unique by both id and title
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    items: Vec<Item>,
}

/// Strips the year suffix and a trailing ", The" from a poster title,
/// e.g. "Shawshank Redemption, The (1994)" becomes "Shawshank Redemption"
pub fn normalize_poster_title(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let without_year: String = chars[..chars.len().saturating_sub(7)].iter().collect();
    match without_year.strip_suffix(", The") {
        Some(stripped) => stripped.to_string(),
        None => without_year,
    }
}

impl Catalog {
    /// Builds a catalog, keeping the first item for each id and each title
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        let mut seen_ids = HashSet::new();
        let mut seen_titles = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| {
                if seen_ids.contains(&item.id) || seen_titles.contains(&item.title) {
                    tracing::debug!(item_id = %item.id, title = %item.title, "Skipping duplicate movie");
                    return false;
                }
                seen_ids.insert(item.id);
                seen_titles.insert(item.title.clone());
                true
            })
            .collect();
        Self { items }
    }

    /// Wraps `items` as-is, without dropping duplicates
    #[cfg(test)]
    pub(crate) fn unchecked(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Loads movies and posters from disk
    pub fn load(movies_path: impl AsRef<Path>, posters_path: impl AsRef<Path>) -> AppResult<Self> {
        let movies = BufReader::new(File::open(movies_path.as_ref())?);
        let posters = BufReader::new(File::open(posters_path.as_ref())?);
        let catalog = Self::from_readers(movies, posters)?;

        tracing::info!(
            items = catalog.len(),
            movies_path = %movies_path.as_ref().display(),
            "Loaded movie catalog"
        );
        Ok(catalog)
    }

    /// Merges a movies JSON array with a tab-separated poster table.
    ///
    /// Movies without a matching poster row are dropped. An empty
    /// `poster_link` keeps the movie but leaves its poster unset.
    pub fn from_readers<M: Read, P: Read>(movies: M, posters: P) -> AppResult<Self> {
        let movies: Vec<Item> = serde_json::from_reader(movies)?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(posters);

        let mut poster_links: HashMap<String, String> = HashMap::new();
        for row in reader.deserialize::<PosterRow>() {
            let row = row?;
            poster_links
                .entry(normalize_poster_title(&row.title))
                .or_insert(row.poster_link);
        }

        let total = movies.len();
        let merged: Vec<Item> = movies
            .into_iter()
            .filter_map(|mut item| {
                let link = poster_links.get(&item.title)?;
                item.poster = Some(link.clone()).filter(|l| !l.trim().is_empty());
                Some(item)
            })
            .collect();

        tracing::debug!(
            movies = total,
            with_poster_row = merged.len(),
            "Merged poster table into catalog"
        );

        Ok(Self::new(merged))
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Position of an item in catalog order
    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Items released within `years`, minus the `exclude`d ones
    pub fn view(&self, years: YearRange, exclude: &[ItemId]) -> Catalog {
        let exclude: HashSet<ItemId> = exclude.iter().copied().collect();
        Catalog::new(
            self.items
                .iter()
                .filter(|item| years.contains(item.year) && !exclude.contains(&item.id))
                .cloned(),
        )
    }

    /// Up to `n` distinct random items not in `exclude`
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, exclude: &[ItemId], rng: &mut R) -> Vec<Item> {
        let pool: Vec<&Item> = self
            .items
            .iter()
            .filter(|item| !exclude.contains(&item.id))
            .collect();
        pool.choose_multiple(rng, n).map(|item| (*item).clone()).collect()
    }
}
