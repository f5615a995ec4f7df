//! Guide document and playlist assembly across devices.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;

use chrono::TimeZone;
use hdhr_api::{Device, LineupChannel, LocalGuideApi};
use hdhr_cache::GuideCache;
use tracing::instrument;

use super::document::GuideDocument;
use super::paginator::GuidePaginator;
use super::playlist::Playlist;
use super::transform::{TransformContext, transform_channel};

/// Assembly switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssembleOptions {
    /// Only fetch guide data for favorite channels. Playlists still list
    /// every channel.
    pub favorites_only: bool,
}

/// Result of one assembly run.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    /// Guide for all devices.
    pub guide: GuideDocument,
    /// Playlist per device id.
    pub playlists: BTreeMap<String, Playlist>,
}

/// Builds the guide and playlists for `devices`.
///
/// Each channel number is paginated at most once per run, even when
/// several devices carry it. A device whose lineup cannot be fetched is
/// skipped; a channel whose first guide page fails is left out of the
/// guide. Both are logged and the run continues.
#[instrument(skip_all, fields(devices = devices.len()))]
pub async fn assemble<A, Tz>(
    api: &A,
    cache: &GuideCache,
    ctx: &TransformContext<Tz>,
    devices: &[Device],
    options: AssembleOptions,
) -> Assembly
where
    A: LocalGuideApi + Sync,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut assembly = Assembly::default();
    let mut seen: HashSet<String> = HashSet::new();

    for device in devices {
        tracing::info!(device_id = %device.id, "Processing device");

        let lineup = match api.fetch_lineup(&device.lineup_url).await {
            Ok(lineup) => lineup,
            Err(e) => {
                tracing::warn!(device_id = %device.id, error = %format!("{e:#}"), "Lineup fetch failed, skipping device");
                continue;
            }
        };
        tracing::info!(device_id = %device.id, channels = lineup.len(), "Lineup received");

        assembly
            .playlists
            .insert(device.id.clone(), Playlist::from_lineup(&lineup));

        for channel in &lineup {
            if options.favorites_only && !channel.favorite {
                tracing::debug!(channel = %channel.guide_number, "Not a favorite, skipping guide");
                continue;
            }
            if !seen.insert(channel.guide_number.clone()) {
                tracing::debug!(channel = %channel.guide_number, "Channel already processed");
                continue;
            }
            add_channel(api, cache, ctx, device, channel, &mut assembly.guide).await;
        }
    }

    tracing::info!(
        channels = assembly.guide.channels.len(),
        programmes = assembly.guide.programmes.len(),
        playlists = assembly.playlists.len(),
        "Assembly completed"
    );
    assembly
}

/// Paginates one channel and appends its elements to `guide`.
async fn add_channel<A, Tz>(
    api: &A,
    cache: &GuideCache,
    ctx: &TransformContext<Tz>,
    device: &Device,
    channel: &LineupChannel,
    guide: &mut GuideDocument,
) where
    A: LocalGuideApi + Sync,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let number = channel.guide_number.as_str();
    let mut paginator = GuidePaginator::new(api, cache, &device.auth_token, number);

    let mut page = match paginator.next_page().await {
        Ok(Some(page)) => page,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(channel = number, error = %format!("{e:#}"), "Guide fetch failed, skipping channel");
            return;
        }
    };
    let Some(header) = page.header() else {
        tracing::info!(channel = number, "No guide data for channel");
        return;
    };
    guide.channels.push(transform_channel(channel, Some(header)));

    let mut programmes: usize = 0;
    loop {
        for program in page.programs() {
            match ctx.transform_program(program, number) {
                Ok(el) => {
                    guide.programmes.push(el);
                    programmes = programmes.saturating_add(1);
                }
                Err(e) => {
                    tracing::warn!(channel = number, title = %program.title, error = %e, "Skipping program");
                }
            }
        }
        page = match paginator.next_page().await {
            Ok(Some(next)) => next,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(
                    channel = number,
                    error = %format!("{e:#}"),
                    "Guide pagination failed, keeping programs fetched so far"
                );
                break;
            }
        };
    }

    tracing::info!(
        channel = number,
        pages = paginator.pages(),
        programmes,
        "Channel guide completed"
    );
}
