//! Swimming many tracks in parallel.

use super::{
    result::SwimResult,
    session::SwimSessionFactory,
    swimmer::{SwimTarget, Swimmer},
    track::TrackState,
};
use crate::field::FieldProbe;
use log::debug;
use rayon::prelude::*;

/// Swims each of the given tracks to the same target in parallel.
///
/// Every worker thread produces its own session from the factory and
/// reuses it for all the tracks it swims. The results are returned in the
/// order of the tracks.
pub fn swim_tracks_in_parallel<P>(
    factory: &SwimSessionFactory<P>,
    tracks: &[TrackState],
    target: &SwimTarget,
) -> Vec<SwimResult>
where
    P: FieldProbe + Clone + Sync + Send,
{
    debug!("Swimming {} tracks to {:?}", tracks.len(), target);
    tracks
        .par_iter()
        .map_init(
            || Swimmer::new(factory.produce()),
            |swimmer, track| {
                swimmer.set_track(track.clone());
                swimmer.swim(target)
            },
        )
        .collect()
}
