//! Parameter host: owns the live parameters and the installed point set.
//!
//! The host is the only place that mutates [`GalaxyParams`] and the only
//! owner of the point-set handle currently in the scene. Replacing the
//! point set is one operation, [`ParameterHost::regenerate`], which removes
//! and disposes the old handle before generating the next cloud.

use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::generator::generate_with_rng;
use crate::params::{GalaxyParams, ParamUpdate};
use crate::scene::{PointMaterial, PointScene};

pub struct ParameterHost<S: PointScene> {
    params: GalaxyParams,
    installed: Option<S::Points>,
    rng: SmallRng,
    generation: u64,
}

impl<S: PointScene> ParameterHost<S> {
    /// Create a host with nothing installed yet.
    pub fn new(params: GalaxyParams) -> Self {
        Self::with_rng(params, SmallRng::from_entropy())
    }

    /// Create a host whose clouds are reproducible for a given seed.
    pub fn with_seed(params: GalaxyParams, seed: u64) -> Self {
        Self::with_rng(params, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(params: GalaxyParams, rng: SmallRng) -> Self {
        Self {
            params,
            installed: None,
            rng,
            generation: 0,
        }
    }

    /// Current parameters.
    pub fn params(&self) -> &GalaxyParams {
        &self.params
    }

    /// The point set currently attached to the scene, if any.
    pub fn installed(&self) -> Option<&S::Points> {
        self.installed.as_ref()
    }

    pub fn is_installed(&self) -> bool {
        self.installed.is_some()
    }

    /// Number of regenerations performed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Swap the installed point set for a freshly generated one.
    ///
    /// The old set is detached and disposed before the new cloud is built,
    /// so at most one generation's resources are alive at a time.
    pub fn regenerate(&mut self, scene: &mut S) {
        if let Some(old) = self.installed.take() {
            scene.remove(&old);
            scene.dispose(old);
        }

        let started = Instant::now();
        let cloud = generate_with_rng(&self.params, &mut self.rng);
        let material = PointMaterial::for_galaxy(&self.params);

        let points = scene.create_points(&cloud, &material);
        scene.add(&points);
        self.installed = Some(points);
        self.generation += 1;

        log::debug!(
            "generation {}: {} points in {:.2?}",
            self.generation,
            cloud.len(),
            started.elapsed()
        );
    }

    /// Apply one committed edit and regenerate.
    ///
    /// The value is trusted as-is; widgets enforce ranges.
    pub fn update_parameter(&mut self, scene: &mut S, update: ParamUpdate) {
        log::debug!("{} changed: {:?}", update.name(), update);
        self.params.apply(update);
        self.regenerate(scene);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::PointCloud;

    #[derive(Debug, PartialEq)]
    struct Handle(usize);

    #[derive(Default)]
    struct Recorder {
        created: Vec<usize>,
        attached: Vec<usize>,
        disposed: Vec<usize>,
        log: Vec<&'static str>,
    }

    impl PointScene for Recorder {
        type Points = Handle;

        fn create_points(&mut self, cloud: &PointCloud, _material: &PointMaterial) -> Handle {
            self.log.push("create");
            self.created.push(cloud.len());
            Handle(self.created.len() - 1)
        }

        fn add(&mut self, points: &Handle) {
            self.log.push("add");
            self.attached.push(points.0);
        }

        fn remove(&mut self, points: &Handle) {
            self.log.push("remove");
            self.attached.retain(|&id| id != points.0);
        }

        fn dispose(&mut self, points: Handle) {
            self.log.push("dispose");
            self.disposed.push(points.0);
        }
    }

    fn small() -> GalaxyParams {
        GalaxyParams { count: 10, ..Default::default() }
    }

    #[test]
    fn test_starts_empty() {
        let host = ParameterHost::<Recorder>::new(small());
        assert!(!host.is_installed());
        assert_eq!(host.generation(), 0);
    }

    #[test]
    fn test_first_regenerate_installs_without_dispose() {
        let mut scene = Recorder::default();
        let mut host = ParameterHost::new(small());
        host.regenerate(&mut scene);

        assert_eq!(scene.log, ["create", "add"]);
        assert_eq!(host.installed(), Some(&Handle(0)));
        assert_eq!(scene.attached, [0]);
    }

    #[test]
    fn test_old_set_released_before_new_one_is_created() {
        let mut scene = Recorder::default();
        let mut host = ParameterHost::new(small());
        host.regenerate(&mut scene);
        host.regenerate(&mut scene);

        assert_eq!(scene.log, ["create", "add", "remove", "dispose", "create", "add"]);
        assert_eq!(scene.disposed, [0]);
        assert_eq!(scene.attached, [1]);
    }

    #[test]
    fn test_exactly_one_attached_after_many_regenerations() {
        let mut scene = Recorder::default();
        let mut host = ParameterHost::new(small());
        for n in 1..=6 {
            host.regenerate(&mut scene);
            assert_eq!(scene.attached.len(), 1);
            assert_eq!(scene.disposed.len(), n - 1);
        }
        assert_eq!(host.generation(), 6);
    }

    #[test]
    fn test_update_parameter_mutates_then_regenerates() {
        let mut scene = Recorder::default();
        let mut host = ParameterHost::new(small());
        host.update_parameter(&mut scene, ParamUpdate::Count(42));

        assert_eq!(host.params().count, 42);
        assert_eq!(scene.created, [42]);
    }

    #[test]
    fn test_seeded_hosts_agree() {
        let mut a = ParameterHost::<Recorder>::with_seed(small(), 9);
        let mut b = ParameterHost::<Recorder>::with_seed(small(), 9);
        let ca = generate_with_rng(&a.params, &mut a.rng);
        let cb = generate_with_rng(&b.params, &mut b.rng);
        assert_eq!(ca, cb);
    }
}
