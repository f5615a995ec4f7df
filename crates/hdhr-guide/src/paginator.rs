//! Per-channel guide pagination.

use anyhow::{Context, Result};
use hdhr_api::{GuidePage, LocalGuideApi};
use hdhr_cache::GuideCache;

/// Where the next request starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// First window, no `Start` (always live).
    First,
    /// Next window at this start (cache-or-fetch).
    At(i64),
    /// Terminal page already returned.
    Done,
}

/// Walks a channel's guide window by window.
///
/// The first page is fetched live; every following page goes through the
/// cache. The sequence ends after the first empty page, which is returned
/// as the last element. Each next start is the previous page's latest end
/// time plus one second; a start that does not move forward ends the walk.
#[derive(Debug)]
pub struct GuidePaginator<'a, A> {
    api: &'a A,
    cache: &'a GuideCache,
    device_auth: &'a str,
    channel_number: &'a str,
    cursor: Cursor,
    pages: u32,
}

impl<'a, A: LocalGuideApi + Sync> GuidePaginator<'a, A> {
    /// Creates a paginator for one channel.
    #[must_use]
    pub const fn new(
        api: &'a A,
        cache: &'a GuideCache,
        device_auth: &'a str,
        channel_number: &'a str,
    ) -> Self {
        Self {
            api,
            cache,
            device_auth,
            channel_number,
            cursor: Cursor::First,
            pages: 0,
        }
    }

    /// Number of pages returned so far.
    #[must_use]
    pub const fn pages(&self) -> u32 {
        self.pages
    }

    /// Returns the next page, or `None` once the walk has ended.
    ///
    /// # Errors
    ///
    /// Returns an error if a live fetch fails. The walk ends after an error.
    pub async fn next_page(&mut self) -> Result<Option<GuidePage>> {
        let requested = self.cursor;
        let result = match requested {
            Cursor::Done => return Ok(None),
            Cursor::First => {
                self.api
                    .fetch_guide(self.device_auth, self.channel_number, None)
                    .await
            }
            Cursor::At(start) => {
                self.cache
                    .get_or_fetch(self.api, self.device_auth, self.channel_number, start)
                    .await
            }
        };
        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.cursor = Cursor::Done;
                return Err(e).with_context(|| {
                    format!(
                        "guide page {} failed for channel {}",
                        self.pages.saturating_add(1),
                        self.channel_number
                    )
                });
            }
        };
        self.pages = self.pages.saturating_add(1);

        self.cursor = match page.max_end_time() {
            None => {
                tracing::info!(
                    channel = self.channel_number,
                    pages = self.pages,
                    "No more guide for channel"
                );
                Cursor::Done
            }
            Some(max_end) => {
                let next_start = max_end.saturating_add(1);
                match requested {
                    Cursor::At(previous_start) if next_start <= previous_start => {
                        tracing::warn!(
                            channel = self.channel_number,
                            previous_start,
                            next_start,
                            "cursor did not advance, stopping pagination"
                        );
                        Cursor::Done
                    }
                    _ => {
                        tracing::debug!(
                            channel = self.channel_number,
                            page = self.pages,
                            programs = page.programs().len(),
                            next_start,
                            "cursor advancing"
                        );
                        Cursor::At(next_start)
                    }
                }
            }
        };

        Ok(Some(page))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::sync::Mutex;

    use anyhow::{Result, bail};
    use hdhr_api::{GuideChannel, LineupChannel, Program};

    use super::*;

    /// Mock API that returns scripted windows in call order and records
    /// the requested starts.
    struct ScriptedGuideApi {
        windows: Vec<Vec<Program>>,
        starts: Mutex<Vec<Option<i64>>>,
        fail_first: bool,
    }

    impl ScriptedGuideApi {
        fn new(windows: Vec<Vec<Program>>) -> Self {
            Self {
                windows,
                starts: Mutex::new(Vec::new()),
                fail_first: false,
            }
        }

        fn starts(&self) -> Vec<Option<i64>> {
            self.starts.lock().unwrap().clone()
        }
    }

    impl LocalGuideApi for ScriptedGuideApi {
        async fn fetch_guide(
            &self,
            _device_auth: &str,
            channel_number: &str,
            start: Option<i64>,
        ) -> Result<GuidePage> {
            let idx = {
                let mut starts = self.starts.lock().unwrap();
                starts.push(start);
                starts.len().saturating_sub(1)
            };
            if self.fail_first && idx == 0 {
                bail!("connection refused");
            }
            let programs = self.windows.get(idx).cloned().unwrap_or_default();
            Ok(make_page(channel_number, start, programs))
        }

        async fn fetch_lineup(&self, _lineup_url: &str) -> Result<Vec<LineupChannel>> {
            Ok(vec![])
        }
    }

    fn make_program(start: i64, end: i64) -> Program {
        Program {
            title: format!("Show {start}"),
            start_time: start,
            end_time: end,
            episode_number: None,
            episode_title: None,
            synopsis: None,
            original_airdate: None,
            image_url: None,
            series_id: None,
            filter: Vec::new(),
        }
    }

    fn make_page(channel: &str, start: Option<i64>, programs: Vec<Program>) -> GuidePage {
        GuidePage::new(
            channel,
            start,
            vec![GuideChannel {
                guide_number: String::from(channel),
                guide_name: None,
                affiliate: None,
                image_url: None,
                guide: programs,
            }],
        )
    }

    async fn drain(paginator: &mut GuidePaginator<'_, ScriptedGuideApi>) -> Vec<GuidePage> {
        let mut pages = Vec::new();
        while let Some(page) = paginator.next_page().await.unwrap() {
            pages.push(page);
        }
        pages
    }

    #[tokio::test]
    async fn test_walks_until_empty_page() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cache = GuideCache::new(dir.path());
        let api = ScriptedGuideApi::new(vec![
            vec![make_program(100, 200), make_program(200, 300)],
            vec![make_program(300, 400)],
            vec![make_program(400, 450), make_program(450, 500)],
        ]);
        let mut paginator = GuidePaginator::new(&api, &cache, "auth", "5.1");

        // Act
        let pages = drain(&mut paginator).await;

        // Assert
        assert_eq!(pages.len(), 4);
        assert!(pages[3].is_empty());
        assert!(pages[..3].iter().all(|p| !p.is_empty()));
        assert_eq!(api.starts(), vec![None, Some(301), Some(401), Some(501)]);
        let starts: Vec<i64> = pages
            .iter()
            .flat_map(|p| p.programs().iter().map(|pr| pr.start_time))
            .collect();
        assert!(starts.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(paginator.pages(), 4);
        assert!(paginator.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_page_is_live_and_later_pages_are_cached() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cache = GuideCache::new(dir.path());
        let api = ScriptedGuideApi::new(vec![
            vec![make_program(100, 200)],
            vec![make_program(200, 300)],
        ]);

        // Act
        drain(&mut GuidePaginator::new(&api, &cache, "auth", "5.1")).await;

        // Assert
        assert!(cache.entry_path("5.1", 201).exists());
        assert!(!cache.entry_path("5.1", 301).exists());
        assert_eq!(std::fs::read_dir(dir.path().join("5.1")).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_fetch() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cache = GuideCache::new(dir.path());
        cache
            .store(&make_page("5.1", Some(201), vec![make_program(200, 300)]))
            .unwrap();
        // Second window is served from the cache, so the scripted second
        // window answers the third request (start 301).
        let api = ScriptedGuideApi::new(vec![vec![make_program(100, 200)], vec![]]);
        let mut paginator = GuidePaginator::new(&api, &cache, "auth", "5.1");

        // Act
        let pages = drain(&mut paginator).await;

        // Assert
        assert_eq!(pages.len(), 3);
        assert_eq!(api.starts(), vec![None, Some(301)]);
        assert_eq!(pages[1].programs()[0].start_time, 200);
    }

    #[tokio::test]
    async fn test_empty_first_page_ends_walk() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cache = GuideCache::new(dir.path());
        let api = ScriptedGuideApi::new(vec![]);
        let mut paginator = GuidePaginator::new(&api, &cache, "auth", "5.1");

        // Act
        let pages = drain(&mut paginator).await;

        // Assert
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
        assert_eq!(api.starts(), vec![None]);
    }

    #[tokio::test]
    async fn test_non_advancing_cursor_stops() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cache = GuideCache::new(dir.path());
        let api = ScriptedGuideApi::new(vec![
            vec![make_program(100, 200)],
            vec![make_program(50, 150)],
            vec![make_program(1_000, 2_000)],
        ]);
        let mut paginator = GuidePaginator::new(&api, &cache, "auth", "5.1");

        // Act
        let pages = drain(&mut paginator).await;

        // Assert
        assert_eq!(pages.len(), 2);
        assert_eq!(api.starts(), vec![None, Some(201)]);
    }

    #[tokio::test]
    async fn test_first_fetch_error_propagates() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cache = GuideCache::new(dir.path());
        let mut api = ScriptedGuideApi::new(vec![vec![make_program(100, 200)]]);
        api.fail_first = true;
        let mut paginator = GuidePaginator::new(&api, &cache, "auth", "5.1");

        // Act
        let err = paginator.next_page().await.unwrap_err();

        // Assert
        assert!(format!("{err:#}").contains("connection refused"));
        assert!(paginator.next_page().await.unwrap().is_none());
        assert_eq!(api.starts().len(), 1);
    }
}
