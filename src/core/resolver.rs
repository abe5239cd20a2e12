use crate::core::locale::display_name;
use crate::core::{RawItem, ResolvedChapter};
use crate::domain::model::generate_uid;
use crate::utils::error::{FeedError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::{HashMap, HashSet};

type BranchKey = Option<String>;

/// Collects chapters in arrival order, refusing ids it has already accepted.
struct ChapterListBuilder {
    ids: HashSet<i64>,
    chapters: Vec<ResolvedChapter>,
}

impl ChapterListBuilder {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: HashSet::with_capacity(capacity),
            chapters: Vec::with_capacity(capacity),
        }
    }

    fn add(&mut self, chapter: ResolvedChapter) -> bool {
        if !self.ids.insert(chapter.id) {
            return false;
        }
        self.chapters.push(chapter);
        true
    }

    fn into_vec(self) -> Vec<ResolvedChapter> {
        self.chapters
    }
}

/// Turns the raw feed into the final chapter list.
///
/// Items are consumed once, in feed order. A chapter lands in the branch named
/// after its language unless that branch already holds its number, in which
/// case it moves to the first free `"<language> (n)"` branch. Chapters without
/// a usable number are numbered sequentially within their branch.
pub struct BranchResolver<'a> {
    source: &'a str,
    date_pattern: &'a str,
}

impl<'a> BranchResolver<'a> {
    pub fn new(source: &'a str, date_pattern: &'a str) -> Self {
        Self {
            source,
            date_pattern,
        }
    }

    pub fn resolve(&self, items: Vec<RawItem>) -> Vec<ResolvedChapter> {
        let probe_limit = items.len();
        let mut builder = ChapterListBuilder::with_capacity(items.len());
        // branch -> (number -> chapter id), scoped to this call
        let mut branches: HashMap<BranchKey, HashMap<i32, i64>> = HashMap::new();
        let mut skipped = 0usize;

        for item in items {
            if item.is_external() {
                skipped += 1;
                continue;
            }
            let chapter = match self.resolve_item(&item, &branches, probe_limit) {
                Ok(chapter) => chapter,
                Err(e) => {
                    tracing::warn!("Skipping chapter: {}", e);
                    skipped += 1;
                    continue;
                }
            };
            let (branch, number, id) = (chapter.branch.clone(), chapter.number, chapter.id);
            if builder.add(chapter) {
                branches.entry(branch).or_default().insert(number, id);
            } else {
                tracing::debug!("Dropping duplicate chapter id {}", id);
            }
        }

        let chapters = builder.into_vec();
        tracing::debug!(
            "Resolved {} chapters across {} branches ({} skipped)",
            chapters.len(),
            branches.len(),
            skipped
        );
        chapters
    }

    fn resolve_item(
        &self,
        item: &RawItem,
        branches: &HashMap<BranchKey, HashMap<i32, i64>>,
        probe_limit: usize,
    ) -> Result<ResolvedChapter> {
        let upstream_id = item
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| FeedError::MalformedData {
                message: "feed item has no id".to_string(),
            })?;

        let declared = item.declared_number();
        let label = item.language().map(display_name);
        let (branch, number) = pick_branch(branches, label, declared, probe_limit)?;

        let name = match item.title() {
            Some(title) => title.to_string(),
            None if declared > 0.0 => format!("Chapter #{}", declared),
            None => format!("Chapter #{}", number),
        };

        Ok(ResolvedChapter {
            id: generate_uid(self.source, upstream_id),
            name,
            number,
            volume: item.attributes.volume.clone(),
            branch,
            scanlator: item.group_name(),
            upload_date: item
                .attributes
                .publish_at
                .as_deref()
                .and_then(|raw| parse_date(raw, self.date_pattern)),
            url: upstream_id.to_string(),
        })
    }
}

/// First branch among `label`, `label (1)`, `label (2)`, ... that has no
/// chapter at the item's number, probing at most `probe_limit` suffixes.
fn pick_branch(
    branches: &HashMap<BranchKey, HashMap<i32, i64>>,
    label: Option<String>,
    declared: f32,
    probe_limit: usize,
) -> Result<(BranchKey, i32)> {
    for suffix in 0..=probe_limit {
        let candidate = match suffix {
            0 => label.clone(),
            n => Some(format!("{} ({})", label.as_deref().unwrap_or("Unknown"), n)),
        };
        let taken = branches.get(&candidate);
        // an unnumbered item takes the branch's next slot, which may already
        // hold a declared number; it then moves on like any other collision
        let number = if declared <= 0.0 {
            taken.map_or(0, |chapters| chapters.len()) as i32 + 1
        } else {
            declared as i32
        };
        if !taken.is_some_and(|chapters| chapters.contains_key(&number)) {
            return Ok((candidate, number));
        }
    }
    Err(FeedError::MalformedData {
        message: format!(
            "no free branch for chapter {} after {} candidates",
            declared,
            probe_limit + 1
        ),
    })
}

fn parse_date(raw: &str, pattern: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, pattern)
        .map(|dt| dt.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_DATE_PATTERN;
    use chrono::{Datelike, Timelike};
    use serde_json::{json, Value};

    fn item(value: Value) -> RawItem {
        serde_json::from_value(value).unwrap()
    }

    fn chapter(id: &str, lang: &str, number: Option<&str>) -> RawItem {
        item(json!({
            "id": id,
            "attributes": {"chapter": number, "translatedLanguage": lang}
        }))
    }

    fn resolve(items: Vec<RawItem>) -> Vec<ResolvedChapter> {
        BranchResolver::new("MANGADEX", DEFAULT_DATE_PATTERN).resolve(items)
    }

    #[test]
    fn test_empty_input() {
        assert!(resolve(vec![]).is_empty());
    }

    #[test]
    fn test_external_items_skipped() {
        let external = item(json!({
            "id": "x1",
            "attributes": {"chapter": "1", "translatedLanguage": "en", "externalUrl": "https://x"}
        }));
        let external2 = item(json!({
            "id": "x2",
            "attributes": {"chapter": "2", "translatedLanguage": "en", "externalUrl": "https://x"}
        }));
        assert!(resolve(vec![external.clone(), external2]).is_empty());

        let chapters = resolve(vec![chapter("a", "en", Some("1")), external]);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].url, "a");
    }

    #[test]
    fn test_sequential_numbers_for_unknown_ordinals() {
        let chapters = resolve(vec![
            chapter("a", "en", None),
            chapter("b", "en", Some("0")),
            chapter("c", "en", Some("-1")),
        ]);
        let numbers: Vec<i32> = chapters.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(chapters.iter().all(|c| c.branch.as_deref() == Some("English")));
        assert_eq!(chapters[0].name, "Chapter #1");
        assert_eq!(chapters[2].name, "Chapter #3");
    }

    #[test]
    fn test_number_collision_gets_suffixed_branch() {
        let chapters = resolve(vec![
            chapter("a", "en", Some("5")),
            chapter("b", "en", Some("5")),
            chapter("c", "en", Some("5")),
        ]);
        let branches: Vec<_> = chapters.iter().map(|c| c.branch.as_deref()).collect();
        assert_eq!(
            branches,
            vec![Some("English"), Some("English (1)"), Some("English (2)")]
        );
        assert!(chapters.iter().all(|c| c.number == 5));
    }

    #[test]
    fn test_distinct_languages_are_distinct_branches() {
        let chapters = resolve(vec![
            chapter("a", "en", Some("1")),
            chapter("b", "ja", Some("1")),
            chapter("c", "en", Some("2")),
        ]);
        let branches: Vec<_> = chapters.iter().map(|c| c.branch.clone().unwrap()).collect();
        assert_eq!(branches, vec!["English", "日本語", "English"]);
    }

    #[test]
    fn test_collision_reuses_earliest_free_suffix() {
        let chapters = resolve(vec![
            chapter("a", "en", Some("1")),
            chapter("b", "en", Some("1")),
            chapter("c", "en", Some("2")),
            chapter("d", "en", Some("2")),
        ]);
        let branches: Vec<_> = chapters.iter().map(|c| c.branch.clone().unwrap()).collect();
        assert_eq!(
            branches,
            vec!["English", "English (1)", "English", "English (1)"]
        );
    }

    #[test]
    fn test_fractional_number_truncates_but_keeps_name() {
        let chapters = resolve(vec![chapter("a", "en", Some("12.5"))]);
        assert_eq!(chapters[0].number, 12);
        assert_eq!(chapters[0].name, "Chapter #12.5");
    }

    #[test]
    fn test_whole_number_name_has_no_fraction() {
        let chapters = resolve(vec![chapter("a", "en", Some("5.0"))]);
        assert_eq!(chapters[0].name, "Chapter #5");
    }

    #[test]
    fn test_no_two_chapters_share_branch_and_number() {
        let mut items = Vec::new();
        for i in 0..40 {
            let number = match i % 4 {
                0 => None,
                1 => Some("3"),
                2 => Some("3.5"),
                _ => Some("4"),
            };
            let lang = if i % 3 == 0 { "ja" } else { "en" };
            items.push(chapter(&format!("id{}", i), lang, number));
        }
        let chapters = resolve(items);
        assert_eq!(chapters.len(), 40);

        let mut seen = HashSet::new();
        for c in &chapters {
            assert!(seen.insert((c.branch.clone(), c.number)), "duplicate {:?}", c);
        }
    }

    #[test]
    fn test_output_preserves_input_order() {
        let items: Vec<RawItem> = (0..20)
            .map(|i| chapter(&format!("id{}", i), if i % 2 == 0 { "en" } else { "fr" }, Some("1")))
            .collect();
        let chapters = resolve(items);
        let urls: Vec<String> = chapters.iter().map(|c| c.url.clone()).collect();
        assert_eq!(urls, (0..20).map(|i| format!("id{}", i)).collect::<Vec<_>>());
    }

    #[test]
    fn test_unnumbered_item_hitting_declared_number_moves_branch() {
        let chapters = resolve(vec![
            chapter("a", "en", Some("1")),
            chapter("b", "en", Some("3")),
            chapter("c", "en", None),
        ]);

        assert_eq!(chapters[1].branch.as_deref(), Some("English"));
        assert_eq!(chapters[1].number, 3);
        // next slot in English is 3, already taken by "b"
        assert_eq!(chapters[2].branch.as_deref(), Some("English (1)"));
        assert_eq!(chapters[2].number, 1);
        assert_eq!(chapters[2].name, "Chapter #1");
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let mut second = chapter("a", "en", Some("2"));
        second.attributes.title = Some("Later copy".to_string());
        let chapters = resolve(vec![chapter("a", "en", Some("1")), second, chapter("b", "en", Some("1"))]);

        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].number, 1);
        assert_eq!(chapters[0].name, "Chapter #1");
        // the rejected copy never claims English/2; "b" still collides with "a" at 1
        assert_eq!(chapters[1].branch.as_deref(), Some("English (1)"));
    }

    #[test]
    fn test_item_without_id_is_skipped() {
        let chapters = resolve(vec![
            item(json!({"attributes": {"chapter": "1", "translatedLanguage": "en"}})),
            chapter("b", "en", Some("2")),
        ]);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].url, "b");
    }

    #[test]
    fn test_missing_language_has_no_branch() {
        let chapters = resolve(vec![
            item(json!({"id": "a", "attributes": {"chapter": "1"}})),
            item(json!({"id": "b", "attributes": {"chapter": "1"}})),
        ]);
        assert_eq!(chapters[0].branch, None);
        assert_eq!(chapters[1].branch.as_deref(), Some("Unknown (1)"));
    }

    #[test]
    fn test_title_scanlator_and_date() {
        let chapters = resolve(vec![item(json!({
            "id": "a",
            "attributes": {
                "chapter": "3",
                "volume": "1",
                "title": "The Road",
                "translatedLanguage": "en",
                "publishAt": "2022-01-02T00:27:11+00:00"
            },
            "relationships": [{"type": "scanlation_group", "attributes": {"name": "Owls"}}]
        }))]);

        let c = &chapters[0];
        assert_eq!(c.name, "The Road");
        assert_eq!(c.scanlator.as_deref(), Some("Owls"));
        assert_eq!(c.volume.as_deref(), Some("1"));
        assert_eq!(c.id, generate_uid("MANGADEX", "a"));
        let date = c.upload_date.unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2022, 1, 2));
        assert_eq!((date.hour(), date.minute(), date.second()), (0, 27, 11));
    }

    #[test]
    fn test_unparseable_date_is_absent() {
        let chapters = resolve(vec![item(json!({
            "id": "a",
            "attributes": {"chapter": "1", "publishAt": "yesterday"}
        }))]);
        assert_eq!(chapters[0].upload_date, None);
    }

    #[test]
    fn test_other_offsets_parse_as_rfc3339() {
        assert!(parse_date("2022-01-02T09:27:11+09:00", DEFAULT_DATE_PATTERN).is_some());
        assert!(parse_date("2022-01-02", DEFAULT_DATE_PATTERN).is_none());
    }
}
