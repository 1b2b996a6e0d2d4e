use crate::core::confidence::ConfidenceBin;
use crate::core::counts::{BinCounts, Summary};
use crate::core::palette::{ChargeClass, Color};
use crate::core::selection::{AtomField, Comparison, Selection};
use crate::engine::config::{ColorConfig, ColorConfigBuilder, ConfigError};
use crate::engine::context::PassContext;
use crate::engine::error::{PassError, PassStep, StepFailure};
use crate::engine::host::{Host, RenderSetting, Representation};
use crate::engine::progress::{Progress, ProgressReporter};
use std::fmt::Display;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ColorReport {
    pub summary: Summary,
}

/// Records the outcome of one step and reports it.
struct StepRunner<'r, 'a> {
    reporter: &'r ProgressReporter<'a>,
    failures: Vec<StepFailure>,
}

impl<'r, 'a> StepRunner<'r, 'a> {
    fn attempt<T, E: Display>(
        &mut self,
        step: PassStep,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Option<T> {
        self.reporter.report(Progress::StepStart { step });
        let outcome = f();
        self.reporter.report(Progress::StepFinish {
            step,
            succeeded: outcome.is_ok(),
        });
        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("[pLDDT] {} failed: {}", step, e);
                self.failures.push(StepFailure {
                    step,
                    message: e.to_string(),
                });
                None
            }
        }
    }

    fn skip(&mut self, step: PassStep, reason: &str) {
        debug!("Skipping {}: {}", step, reason);
        self.reporter.report(Progress::StepSkipped { step });
    }
}

fn planned_steps(config: &ColorConfig) -> u64 {
    let mut steps = 2 + ConfidenceBin::ALL.len() as u64;
    if config.catalytic.show_spheres {
        steps += 1;
    }
    if config.surface.enabled {
        // surface plus catalytic patch
        steps += 2;
    }
    steps
}

/// Runs one complete coloring pass against `host`.
///
/// Every independent step is attempted even when an earlier one fails; all
/// failures are returned together in [`PassError::StepsFailed`].
#[instrument(skip_all, name = "coloring_pass", fields(scope = %config.scope))]
pub fn run<H: Host>(
    host: &mut H,
    config: &ColorConfig,
    reporter: &ProgressReporter,
) -> Result<ColorReport, PassError> {
    config.validate()?;
    reporter.report(Progress::PassStart {
        total_steps: planned_steps(config),
    });

    let ctx = PassContext::new(&config.temp_prefix, &config.marker_atom);
    let palette = &config.palette;
    let scope = Selection::scope(&config.scope);
    let markers = scope.clone().and(Selection::atom_name(&config.marker_atom));
    let mut runner = StepRunner {
        reporter,
        failures: Vec::new(),
    };

    debug!("Clearing temporary names from previous passes.");
    ctx.reset(host);

    let catalytic_color = Color::Named(ctx.catalytic_color());
    let patch_color = Color::Named(ctx.patch_color());
    runner.attempt(PassStep::RegisterColors, || {
        host.set_color(&ctx.catalytic_color(), palette.catalytic)?;
        host.set_color(&ctx.patch_color(), palette.patch)
    });

    let mut counts = Some(BinCounts::default());
    for bin in ConfidenceBin::ALL {
        let name = ctx.bin_selection(bin);
        let (lower, upper) = config.thresholds.bounds(bin, config.rule);
        let predicate = markers
            .clone()
            .and(Selection::within(AtomField::BFactor, lower, upper));
        let counted = runner.attempt(PassStep::Bin(bin), || {
            host.select(&name, &predicate)?;
            host.color(palette.for_bin(bin), &Selection::named(&name).by_residue())?;
            host.count_atoms(&Selection::named(&name))
        });
        counts = match (counted, counts) {
            (Some(n), Some(mut c)) => {
                *c.get_mut(bin) = n;
                Some(c)
            }
            _ => None,
        };
    }

    let catalytic_name = ctx.catalytic_selection();
    let catalytic = Selection::named(&catalytic_name);
    let catalytic_predicate = markers.clone().and(Selection::compare(
        AtomField::Occupancy,
        Comparison::Greater,
        config.catalytic.cutoff,
    ));
    let catalytic_count = runner.attempt(PassStep::CatalyticSelection, || {
        host.select(&catalytic_name, &catalytic_predicate)?;
        host.count_atoms(&catalytic)
    });
    counts = match (catalytic_count, counts) {
        (Some(n), Some(c)) => Some(BinCounts { catalytic: n, ..c }),
        _ => None,
    };

    if config.catalytic.show_spheres && catalytic_count.is_none() {
        runner.skip(PassStep::CatalyticHighlight, "catalytic selection failed");
    } else if config.catalytic.show_spheres {
        runner.attempt(PassStep::CatalyticHighlight, || {
            host.show(Representation::Spheres, &catalytic)?;
            host.color(&catalytic_color, &catalytic)?;
            host.set(
                &RenderSetting::SphereScale(config.catalytic.sphere_scale),
                &catalytic,
            )
        });
    }

    if config.surface.enabled {
        runner.attempt(PassStep::Surface, || {
            host.show(Representation::Surface, &scope)?;
            host.set(
                &RenderSetting::Transparency(config.surface.transparency),
                &scope,
            )?;
            host.set(
                &RenderSetting::SurfaceColor(palette.for_charge(ChargeClass::Neutral).clone()),
                &scope,
            )?;
            for class in [ChargeClass::Acidic, ChargeClass::Basic] {
                let charged = scope
                    .clone()
                    .and(Selection::residue_names(class.residue_names()));
                host.set(
                    &RenderSetting::SurfaceColor(palette.for_charge(class).clone()),
                    &charged,
                )?;
            }
            Ok::<(), H::Error>(())
        });

        match catalytic_count {
            Some(0) => runner.skip(PassStep::CatalyticPatch, "no catalytic residues in scope"),
            Some(_) => {
                let patch_name = ctx.patch_object();
                let patch = Selection::named(&patch_name);
                runner.attempt(PassStep::CatalyticPatch, || {
                    host.create(&patch_name, &catalytic.clone().by_residue())?;
                    host.show(Representation::Surface, &patch)?;
                    host.set(&RenderSetting::Transparency(0.0), &patch)?;
                    host.set(&RenderSetting::SurfaceColor(patch_color.clone()), &patch)
                });
            }
            None => runner.skip(PassStep::CatalyticPatch, "catalytic selection failed"),
        }
    }

    reporter.report(Progress::PassFinish);

    let summary = counts.map(|counts| Summary {
        scope: config.scope.clone(),
        marker_atom: config.marker_atom.clone(),
        thresholds: config.thresholds,
        rule: config.rule,
        cutoff: config.catalytic.cutoff,
        counts,
    });

    match summary {
        Some(summary) if runner.failures.is_empty() => Ok(ColorReport { summary }),
        summary => Err(PassError::StepsFailed {
            summary,
            failures: runner.failures,
        }),
    }
}

/// Outcome of a best-effort pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Applied {
    /// Present whenever the counting steps succeeded, even if a display step failed.
    pub summary: Option<Summary>,
    /// One `[pLDDT] ...` line per failure, already logged.
    pub failures: Vec<String>,
}

/// User-facing lines describing every failure carried by `error`.
pub fn failure_lines(scope: &str, error: &PassError) -> Vec<String> {
    match error {
        PassError::StepsFailed { failures, .. } => failures
            .iter()
            .map(|failure| format!("[pLDDT] Coloring of '{}': {}", scope, failure))
            .collect(),
        e => vec![format!("[pLDDT] Coloring of '{}' failed: {}", scope, e)],
    }
}

/// Best-effort pass: logs the summary or every failure and never propagates.
pub fn apply<H: Host>(host: &mut H, config: &ColorConfig, reporter: &ProgressReporter) -> Applied {
    let (summary, failures) = match run(host, config, reporter) {
        Ok(report) => (Some(report.summary), Vec::new()),
        Err(e) => {
            let failures = failure_lines(&config.scope, &e);
            let summary = match e {
                PassError::StepsFailed { summary, .. } => summary,
                PassError::InvalidConfig(_) => None,
            };
            (summary, failures)
        }
    };
    for line in &failures {
        error!("{}", line);
    }
    if let Some(summary) = &summary {
        info!("{}", summary);
    }
    Applied { summary, failures }
}

/// Command entry: colors `scope` (default `all`) with the given catalytic cutoff
/// (default 9.0) and every other setting at its default.
pub fn color_plddt<H: Host>(
    host: &mut H,
    scope: Option<&str>,
    cutoff: Option<f64>,
) -> Result<Applied, ConfigError> {
    let mut builder = ColorConfigBuilder::new();
    if let Some(scope) = scope {
        builder = builder.scope(scope);
    }
    if let Some(cutoff) = cutoff {
        builder = builder.cutoff(cutoff);
    }
    let config = builder.build()?;
    Ok(apply(host, &config, &ProgressReporter::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::confidence::{BinThresholds, BoundaryRule, tally};
    use crate::core::models::builder::StructureBuilder;
    use crate::core::palette::Rgb;
    use crate::engine::host::HostCapabilities;
    use crate::engine::scene::{Scene, SceneError};
    use std::sync::{Arc, Mutex};

    /// Builds one single-residue chain per `(confidence, marker)` pair; each
    /// residue gets a backbone N alongside its CA.
    fn scene_with_markers(markers: &[(f64, f64)]) -> Scene {
        let mut b = StructureBuilder::new();
        b.start_object("model");
        b.start_chain('A').unwrap();
        for (i, &(conf, q)) in markers.iter().enumerate() {
            let resi = i as isize + 1;
            let resn = if i % 2 == 0 { "ASP" } else { "LYS" };
            b.start_residue(resi, resn).unwrap();
            b.add_atom(2 * i + 1, "N", conf, 1.0).unwrap();
            b.add_atom(2 * i + 2, "CA", conf, q).unwrap();
        }
        Scene::new(b.build())
    }

    fn counts_of(report: &ColorReport) -> (usize, usize, usize, usize, usize) {
        let c = report.summary.counts;
        (c.low, c.mid, c.high, c.very_high, c.catalytic)
    }

    #[test]
    fn three_markers_land_in_expected_bins() {
        let mut scene = scene_with_markers(&[(40.0, 1.0), (60.0, 1.0), (95.0, 1.0)]);
        let report = run(&mut scene, &ColorConfig::default(), &ProgressReporter::new()).unwrap();
        assert_eq!(counts_of(&report), (1, 1, 0, 1, 0));
        assert_eq!(
            report.summary.to_string(),
            "[pLDDT] CA counts in 'all': <50=1, 50-70=1, 70-90=0, >=90=1, catalytic (q > 9.0)=0"
        );
    }

    #[test]
    fn whole_residues_take_their_bin_color() {
        let mut scene = scene_with_markers(&[(40.0, 1.0), (60.0, 1.0), (95.0, 1.0)]);
        run(&mut scene, &ColorConfig::default(), &ProgressReporter::new()).unwrap();
        let expected = [(1, "red"), (2, "yellow"), (3, "blue")];
        for (resi, color) in expected {
            for atom in ["N", "CA"] {
                let id = scene.find_atom("model", 'A', resi, atom).unwrap();
                assert_eq!(scene.atom_color(id), Some(&Color::named(color)));
            }
        }
    }

    #[test]
    fn boundary_score_follows_default_rule() {
        let mut scene = scene_with_markers(&[(50.0, 1.0)]);
        let report = run(&mut scene, &ColorConfig::default(), &ProgressReporter::new()).unwrap();
        assert_eq!(counts_of(&report), (0, 1, 0, 0, 0));
    }

    #[test]
    fn boundary_score_under_lower_inclusive_rule() {
        let mut scene = scene_with_markers(&[(50.0, 1.0)]);
        let config = ColorConfigBuilder::new()
            .rule(BoundaryRule::LowerInclusive)
            .build()
            .unwrap();
        let report = run(&mut scene, &config, &ProgressReporter::new()).unwrap();
        assert_eq!(counts_of(&report), (1, 0, 0, 0, 0));
        assert!(report.summary.to_string().contains("<=50=1"));
    }

    #[test]
    fn only_markers_strictly_above_cutoff_are_catalytic() {
        let mut scene = scene_with_markers(&[(80.0, 9.0), (80.0, 9.1)]);
        let report = run(&mut scene, &ColorConfig::default(), &ProgressReporter::new()).unwrap();
        assert_eq!(report.summary.counts.catalytic, 1);
        let hit = scene.find_atom("model", 'A', 2, "CA").unwrap();
        let miss = scene.find_atom("model", 'A', 1, "CA").unwrap();
        assert!(scene.representations(hit).contains(&Representation::Spheres));
        assert!(scene.representations(miss).is_empty());
        assert_eq!(scene.atom_color(hit), Some(&Color::named("plddt_catalytic")));
        assert_eq!(scene.atom_settings(hit).sphere_scale, Some(0.6));
        assert_eq!(
            scene.custom_color("plddt_catalytic"),
            Some(Rgb::new([1.0, 0.0, 1.0]).unwrap())
        );
    }

    #[test]
    fn empty_scope_yields_zero_counts() {
        let mut scene = scene_with_markers(&[(40.0, 10.0), (95.0, 1.0)]);
        let config = ColorConfigBuilder::new().scope("none").build().unwrap();
        let report = run(&mut scene, &config, &ProgressReporter::new()).unwrap();
        assert_eq!(counts_of(&report), (0, 0, 0, 0, 0));

        let mut empty = Scene::default();
        let report = run(&mut empty, &ColorConfig::default(), &ProgressReporter::new()).unwrap();
        assert_eq!(report.summary.counts, BinCounts::default());
    }

    #[test]
    fn repeated_passes_are_idempotent() {
        let mut scene = scene_with_markers(&[(30.0, 9.5), (55.0, 1.0), (72.0, 1.0), (99.0, 12.0)]);
        let config = ColorConfigBuilder::new().surface(true).build().unwrap();
        let first = run(&mut scene, &config, &ProgressReporter::new()).unwrap();
        let names_after_first = scene.selection_names().len();
        let atoms_after_first = scene.structure().atom_count();
        let second = run(&mut scene, &config, &ProgressReporter::new()).unwrap();
        assert_eq!(first, second);
        assert_eq!(scene.selection_names().len(), names_after_first);
        assert_eq!(scene.structure().atom_count(), atoms_after_first);
    }

    #[test]
    fn scene_counts_agree_with_pure_tally() {
        let markers = [
            (-5.0, 0.0),
            (49.99, 9.0),
            (50.0, 9.01),
            (69.0, 3.0),
            (70.0, 20.0),
            (89.99, 0.0),
            (90.0, 9.0),
            (100.0, 10.0),
        ];
        for rule in [BoundaryRule::UpperInclusive, BoundaryRule::LowerInclusive] {
            let mut scene = scene_with_markers(&markers);
            let config = ColorConfigBuilder::new().rule(rule).build().unwrap();
            let report = run(&mut scene, &config, &ProgressReporter::new()).unwrap();
            let expected = tally(markers, &BinThresholds::default(), rule, 9.0);
            assert_eq!(report.summary.counts, expected, "rule {}", rule);
            assert_eq!(report.summary.counts.total(), markers.len());
        }
    }

    #[test]
    fn surface_pass_colors_by_charge_and_patches_catalytic_residues() {
        let mut scene = scene_with_markers(&[(40.0, 9.5), (95.0, 1.0)]);
        let config = ColorConfigBuilder::new().surface(true).build().unwrap();
        run(&mut scene, &config, &ProgressReporter::new()).unwrap();

        let asp = scene.find_atom("model", 'A', 1, "N").unwrap();
        let lys = scene.find_atom("model", 'A', 2, "N").unwrap();
        assert!(scene.representations(asp).contains(&Representation::Surface));
        assert_eq!(scene.atom_settings(asp).transparency, Some(0.5));
        assert_eq!(scene.atom_settings(asp).surface_color, Some(Color::named("red")));
        assert_eq!(scene.atom_settings(lys).surface_color, Some(Color::named("blue")));

        let patch_atom = scene
            .find_atom("plddt_catalytic_patch", 'A', 1, "N")
            .unwrap();
        let patch_settings = scene.atom_settings(patch_atom);
        assert_eq!(patch_settings.transparency, Some(0.0));
        assert_eq!(
            patch_settings.surface_color,
            Some(Color::named("plddt_patch"))
        );
        assert!(scene.find_atom("plddt_catalytic_patch", 'A', 2, "N").is_none());
    }

    #[test]
    fn surface_patch_is_skipped_without_catalytic_residues() {
        let mut scene = scene_with_markers(&[(40.0, 1.0)]);
        let config = ColorConfigBuilder::new().surface(true).build().unwrap();
        run(&mut scene, &config, &ProgressReporter::new()).unwrap();
        assert!(!scene.has_name("plddt_catalytic_patch"));
    }

    #[test]
    fn unknown_scope_fails_every_step_but_is_reported_together() {
        let mut scene = scene_with_markers(&[(40.0, 1.0)]);
        let config = ColorConfigBuilder::new().scope("ghost").build().unwrap();
        let err = run(&mut scene, &config, &ProgressReporter::new()).unwrap_err();
        let PassError::StepsFailed { summary, failures } = err else {
            panic!("expected aggregated step failures");
        };
        assert!(summary.is_none());
        let steps: Vec<_> = failures.iter().map(|f| f.step).collect();
        assert_eq!(
            steps,
            vec![
                PassStep::Bin(ConfidenceBin::Low),
                PassStep::Bin(ConfidenceBin::Mid),
                PassStep::Bin(ConfidenceBin::High),
                PassStep::Bin(ConfidenceBin::VeryHigh),
                PassStep::CatalyticSelection,
            ]
        );
        assert!(failures[0].message.contains("ghost"));
    }

    #[test]
    fn failing_display_step_keeps_counts() {
        let mut scene = scene_with_markers(&[(40.0, 1.0), (95.0, 1.0)]);
        let mut palette = ColorConfig::default().palette;
        palette.neutral = Color::named("not_a_color");
        let config = ColorConfigBuilder::new()
            .surface(true)
            .palette(palette)
            .build()
            .unwrap();
        let err = run(&mut scene, &config, &ProgressReporter::new()).unwrap_err();
        let PassError::StepsFailed { summary, failures } = err else {
            panic!("expected aggregated step failures");
        };
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].step, PassStep::Surface);
        assert_eq!(
            failures[0].message,
            SceneError::UnknownColor("not_a_color".into()).to_string()
        );
        let summary = summary.unwrap();
        assert_eq!(summary.counts.low, 1);
        assert_eq!(summary.counts.very_high, 1);
        let residue_atom = scene.find_atom("model", 'A', 1, "N").unwrap();
        assert_eq!(scene.atom_color(residue_atom), Some(&Color::named("red")));
    }

    #[test]
    fn invalid_config_is_rejected_before_touching_host() {
        let mut scene = scene_with_markers(&[(40.0, 1.0)]);
        let mut config = ColorConfig::default();
        config.catalytic.cutoff = f64::INFINITY;
        let err = run(&mut scene, &config, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, PassError::InvalidConfig(ConfigError::NonFiniteCutoff(_))));
        assert!(scene.command_log().is_empty());
    }

    #[test]
    fn progress_events_cover_every_step() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |p| {
            sink.lock().unwrap().push(p);
        }));
        let mut scene = scene_with_markers(&[(40.0, 10.0)]);
        run(&mut scene, &ColorConfig::default(), &reporter).unwrap();

        let events = events.lock().unwrap();
        let Some(Progress::PassStart { total_steps }) = events.first() else {
            panic!("first event must announce the pass");
        };
        let finished = events
            .iter()
            .filter(|e| matches!(e, Progress::StepFinish { succeeded: true, .. }))
            .count() as u64;
        assert_eq!(finished, *total_steps);
        assert!(matches!(events.last(), Some(Progress::PassFinish)));
    }

    fn recorded_pass(scene: &mut Scene, config: &ColorConfig) -> Vec<Progress> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |p| {
            sink.lock().unwrap().push(p);
        }));
        let _ = run(scene, config, &reporter);
        let events = events.lock().unwrap().clone();
        events
    }

    fn completed_steps(events: &[Progress]) -> u64 {
        events
            .iter()
            .filter(|e| matches!(e, Progress::StepFinish { .. } | Progress::StepSkipped { .. }))
            .count() as u64
    }

    #[test]
    fn skipped_patch_still_completes_the_planned_steps() {
        let mut scene = scene_with_markers(&[(40.0, 1.0), (95.0, 2.0)]);
        let config = ColorConfigBuilder::new().surface(true).build().unwrap();
        let events = recorded_pass(&mut scene, &config);

        let Some(Progress::PassStart { total_steps }) = events.first() else {
            panic!("first event must announce the pass");
        };
        assert_eq!(*total_steps, 9);
        assert_eq!(completed_steps(&events), 9);
        assert!(events.iter().any(|e| matches!(
            e,
            Progress::StepSkipped {
                step: PassStep::CatalyticPatch
            }
        )));
    }

    #[test]
    fn failed_catalytic_selection_skips_dependent_steps() {
        let mut scene = scene_with_markers(&[(40.0, 10.0)]);
        let config = ColorConfigBuilder::new()
            .scope("ghost")
            .surface(true)
            .build()
            .unwrap();
        let events = recorded_pass(&mut scene, &config);

        let Some(Progress::PassStart { total_steps }) = events.first() else {
            panic!("first event must announce the pass");
        };
        assert_eq!(completed_steps(&events), *total_steps);
        let skipped: Vec<PassStep> = events
            .iter()
            .filter_map(|e| match e {
                Progress::StepSkipped { step } => Some(*step),
                _ => None,
            })
            .collect();
        assert_eq!(
            skipped,
            vec![PassStep::CatalyticHighlight, PassStep::CatalyticPatch]
        );
    }

    #[test]
    fn failure_lines_describe_invalid_configs() {
        let err = PassError::InvalidConfig(ConfigError::EmptyScope);
        assert_eq!(
            failure_lines("all", &err),
            vec!["[pLDDT] Coloring of 'all' failed: Invalid coloring configuration: Scope expression cannot be empty".to_string()]
        );
    }

    #[test]
    fn apply_swallows_failures() {
        let mut scene = scene_with_markers(&[(40.0, 1.0)]);
        let config = ColorConfigBuilder::new().scope("ghost").build().unwrap();
        let applied = apply(&mut scene, &config, &ProgressReporter::new());
        assert!(applied.summary.is_none());
        assert_eq!(applied.failures.len(), 5);
        assert!(applied
            .failures
            .iter()
            .all(|line| line.starts_with("[pLDDT] Coloring of 'ghost': ")));
    }

    #[test]
    fn color_plddt_uses_defaults_and_overrides() {
        let mut scene = scene_with_markers(&[(80.0, 9.0), (80.0, 9.1)]);
        let summary = color_plddt(&mut scene, None, None).unwrap().summary.unwrap();
        assert_eq!(summary.scope, "all");
        assert_eq!(summary.counts.catalytic, 1);

        let summary = color_plddt(&mut scene, Some("chain A"), Some(8.0))
            .unwrap()
            .summary
            .unwrap();
        assert_eq!(summary.counts.catalytic, 2);

        assert!(color_plddt(&mut scene, None, Some(f64::NAN)).is_err());
    }

    #[test]
    fn rejected_arguments_leave_the_scene_untouched() {
        let mut scene = scene_with_markers(&[(80.0, 9.5)]);
        assert!(matches!(
            color_plddt(&mut scene, Some(""), None),
            Err(ConfigError::EmptyScope)
        ));
        assert!(color_plddt(&mut scene, Some("all"), Some(f64::INFINITY)).is_err());
        assert!(scene.command_log().is_empty());
    }

    #[test]
    fn capabilities_do_not_affect_the_pass() {
        let mut scene = scene_with_markers(&[(95.0, 1.0)])
            .with_capabilities(HostCapabilities { menu: true, command: true });
        let report = run(&mut scene, &ColorConfig::default(), &ProgressReporter::new()).unwrap();
        assert_eq!(report.summary.counts.very_high, 1);
        assert!(scene.menu_items().is_empty());
        assert!(scene.registered_commands().is_empty());
    }
}
