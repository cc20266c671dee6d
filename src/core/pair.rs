//! Interferometric pair selection.
//!
//! Scenes from different relative orbits cannot be coregistered, so
//! candidates are first narrowed to the orbit with the most acquisitions;
//! within that track the two scenes nearest the target dates are picked.
//! Selection is a stable linear scan: candidate lists are small (tens of
//! records) and encounter order doubles as the tie-break.

use crate::types::{InsarError, InsarResult, ScenePair, SceneRecord};
use chrono::{DateTime, Utc};

/// Select an interferometric pair from `scenes`.
///
/// `start_target` and `end_target` are the timestamps the two picks
/// should be nearest to. The returned pair is guaranteed distinct by
/// file-name identity.
pub fn select_pair(
    scenes: &[SceneRecord],
    start_target: DateTime<Utc>,
    end_target: DateTime<Utc>,
) -> InsarResult<ScenePair> {
    let orbit = busiest_orbit(scenes)?;
    let on_track: Vec<&SceneRecord> = scenes
        .iter()
        .filter(|s| s.usable_orbit() == Some(orbit))
        .collect();
    if on_track.len() < 2 {
        return Err(InsarError::InsufficientScenes(format!(
            "orbit {} has {} scene(s), need at least two",
            orbit,
            on_track.len()
        )));
    }
    log::info!(
        "Orbit {} selected with {} candidate scene(s)",
        orbit,
        on_track.len()
    );

    let first = nearest_index(&on_track, start_target);
    let mut second = nearest_index(&on_track, end_target);

    if on_track[first].file_name == on_track[second].file_name {
        log::warn!(
            "Both targets nearest-match {}; substituting second-nearest to start",
            on_track[first].file_name
        );
        second = substitute_index(&on_track, start_target, &on_track[first].file_name)?;
    }

    Ok(ScenePair {
        reference: on_track[first].clone(),
        secondary: on_track[second].clone(),
    })
}

/// Orbit value with the most member scenes, ignoring records without a
/// usable orbit. Group-size ties keep the first-encountered orbit.
fn busiest_orbit(scenes: &[SceneRecord]) -> InsarResult<u32> {
    // counts in first-seen order; a map would lose the encounter order
    // the tie-break depends on
    let mut counts: Vec<(u32, usize)> = Vec::new();
    for scene in scenes {
        if let Some(orbit) = scene.usable_orbit() {
            match counts.iter_mut().find(|(o, _)| *o == orbit) {
                Some((_, n)) => *n += 1,
                None => counts.push((orbit, 1)),
            }
        }
    }

    let mut best: Option<(u32, usize)> = None;
    for (orbit, n) in counts {
        match best {
            Some((_, best_n)) if n <= best_n => {}
            _ => best = Some((orbit, n)),
        }
    }
    best.map(|(orbit, _)| orbit).ok_or(InsarError::NoOrbitData)
}

/// Index of the scene nearest `target`; first wins on ties.
fn nearest_index(on_track: &[&SceneRecord], target: DateTime<Utc>) -> usize {
    let mut best = 0;
    let mut best_offset = abs_offset_ms(on_track[0], target);
    for (i, scene) in on_track.iter().enumerate().skip(1) {
        let offset = abs_offset_ms(scene, target);
        if offset < best_offset {
            best = i;
            best_offset = offset;
        }
    }
    best
}

/// Index of the scene nearest `target` excluding `exclude` by identity;
/// first wins on ties.
fn substitute_index(
    on_track: &[&SceneRecord],
    target: DateTime<Utc>,
    exclude: &str,
) -> InsarResult<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (i, scene) in on_track.iter().enumerate() {
        if scene.file_name == exclude {
            continue;
        }
        let offset = abs_offset_ms(scene, target);
        match best {
            Some((_, best_offset)) if offset >= best_offset => {}
            _ => best = Some((i, offset)),
        }
    }
    best.map(|(i, _)| i).ok_or_else(|| {
        InsarError::DistinctPair(format!("no candidate distinct from {}", exclude))
    })
}

fn abs_offset_ms(scene: &SceneRecord, target: DateTime<Utc>) -> i64 {
    (scene.start_time - target).num_milliseconds().abs()
}
