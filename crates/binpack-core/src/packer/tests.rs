use super::*;
use crate::solver::SolverBackend;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Backend that answers with a canned outcome built from the model it receives.
struct ScriptedSolver<F> {
    answer: F,
    calls: AtomicUsize,
}

impl<F> ScriptedSolver<F>
where
    F: Fn(&Model) -> SolverOutput + Send + Sync,
{
    fn new(answer: F) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<F> MilpSolver for ScriptedSolver<F>
where
    F: Fn(&Model) -> SolverOutput + Send + Sync,
{
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn solve(&self, model: &Model, _config: &SolverConfig) -> SolverOutput {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.answer)(model)
    }
}

fn request(items: Vec<Item>) -> PackingRequest {
    PackingRequest {
        items,
        bin_types: vec![BinType {
            id: "board".to_string(),
            ..BinType::new(20.0, 10.0, 5.0)
        }],
        costs: CostConfig::default(),
        solver: SolverConfig::default(),
    }
}

/// Both 10x10 items side by side in the first slot.
fn side_by_side(model: &Model) -> Vec<f64> {
    let layout = model.layout();
    let mut values = vec![0.0; model.num_variables()];
    values[layout.z(0).index()] = 1.0;
    values[layout.f(0, 0).index()] = 1.0;
    values[layout.f(1, 0).index()] = 1.0;
    values[layout.x(1).index()] = 10.0;
    values[layout.l(0, 1).index()] = 1.0;
    values[layout.mlw(0).unwrap().index()] = 1.0;
    values[layout.mlh(0).unwrap().index()] = 1.0;
    values[layout.lw(1).index()] = 20.0;
    values[layout.lh(1).index()] = 10.0;
    values
}

fn two_squares() -> Packer {
    Packer::new(request(vec![Item::new(10.0, 10.0), Item::new(10.0, 10.0)])).unwrap()
}

#[test]
fn test_scripted_assignment_is_feasible() {
    let packer = two_squares();
    let model = packer.build_model();
    assert!(model.violations(&side_by_side(&model), 1e-6).is_empty());
}

#[test]
fn test_optimal_solution_is_decoded() {
    let solver = ScriptedSolver::new(|model: &Model| SolverOutput::optimal(side_by_side(model), 1.5));
    let result = two_squares().pack_with(&solver).unwrap();

    assert_eq!(solver.calls(), 1);
    assert_eq!(result.status, SolutionStatus::Optimal);
    assert!(!result.may_be_suboptimal());
    assert_eq!(result.total_cost, 5.0);
    assert_eq!(result.objective, 1.5);
    assert_eq!(result.bins.len(), 1);
    assert_eq!(result.bins[0].bin_type_id, "board");
    assert_eq!(result.bins_required.get("board"), Some(&1));
}

#[test]
fn test_feasible_solution_is_flagged() {
    let solver = ScriptedSolver::new(|model: &Model| SolverOutput::feasible(side_by_side(model), 2.0));
    let result = two_squares().pack_with(&solver).unwrap();

    assert_eq!(result.status, SolutionStatus::Feasible);
    assert!(result.may_be_suboptimal());
    assert_eq!(result.total_cost, 5.0);
}

#[test]
fn test_timeout_with_incumbent_is_flagged() {
    let solver = ScriptedSolver::new(|model: &Model| SolverOutput {
        status: SolutionStatus::Timeout,
        values: Some(side_by_side(model)),
        objective: None,
        message: "time limit".to_string(),
    });
    let packer = two_squares();
    let result = packer.pack_with(&solver).unwrap();

    assert_eq!(result.status, SolutionStatus::Feasible);
    // Without a reported objective the assignment is evaluated instead
    let model = packer.build_model();
    assert_eq!(result.objective, model.evaluate(&side_by_side(&model)));
}

#[test]
fn test_timeout_without_incumbent() {
    let solver = ScriptedSolver::new(|_: &Model| SolverOutput::timeout());
    let err = two_squares().pack_with(&solver).unwrap_err();
    assert!(matches!(err, PackingError::TimeLimitExceeded));
}

#[test]
fn test_infeasible_is_reported() {
    let solver = ScriptedSolver::new(|_: &Model| SolverOutput::infeasible());
    let err = two_squares().pack_with(&solver).unwrap_err();
    assert!(matches!(err, PackingError::Infeasible));
}

#[test]
fn test_backend_error_keeps_message() {
    let solver = ScriptedSolver::new(|_: &Model| SolverOutput::error("license expired"));
    let err = two_squares().pack_with(&solver).unwrap_err();
    match err {
        PackingError::Solver(message) => assert_eq!(message, "license expired"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_short_value_vector_is_malformed() {
    let solver = ScriptedSolver::new(|_: &Model| SolverOutput::optimal(vec![0.0; 4], 0.0));
    let err = two_squares().pack_with(&solver).unwrap_err();
    assert!(matches!(err, PackingError::MalformedSolution(_)));
}

#[test]
fn test_no_items_skips_solver() {
    let solver = ScriptedSolver::new(|_: &Model| SolverOutput::error("should not run"));
    let result = Packer::new(request(Vec::new()))
        .unwrap()
        .pack_with(&solver)
        .unwrap();

    assert_eq!(solver.calls(), 0);
    assert!(result.bins.is_empty());
    assert_eq!(result.total_cost, 0.0);
    assert_eq!(result.status, SolutionStatus::Optimal);
}

#[test]
fn test_oversized_item_is_infeasible_without_solving() {
    let solver = ScriptedSolver::new(|_: &Model| SolverOutput::error("should not run"));
    let packer = Packer::new(request(vec![Item::new(10.0, 10.0), Item::new(15.0, 15.0)])).unwrap();

    let err = packer.pack_with(&solver).unwrap_err();
    assert!(matches!(err, PackingError::Infeasible));
    assert_eq!(solver.calls(), 0);
}

#[test]
fn test_rotation_makes_item_placeable() {
    let solver = ScriptedSolver::new(|_: &Model| SolverOutput::infeasible());
    let packer = Packer::new(request(vec![Item::new(10.0, 20.0).rotatable()])).unwrap();

    // The item fits once turned, so the backend is consulted
    let _ = packer.pack_with(&solver);
    assert_eq!(solver.calls(), 1);
}

#[test]
fn test_rejects_bad_solver_limits() {
    let mut bad_time = request(vec![Item::new(10.0, 10.0)]);
    bad_time.solver.time_limit = 0.0;
    assert!(matches!(
        Packer::new(bad_time),
        Err(PackingError::InvalidInput(_))
    ));

    let mut bad_gap = request(vec![Item::new(10.0, 10.0)]);
    bad_gap.solver.mip_gap = -0.1;
    assert!(matches!(
        Packer::new(bad_gap),
        Err(PackingError::InvalidInput(_))
    ));

    let mut nan_time = request(vec![Item::new(10.0, 10.0)]);
    nan_time.solver.time_limit = f64::NAN;
    assert!(Packer::new(nan_time).is_err());
}

#[test]
fn test_request_validation_errors_surface() {
    let mut req = request(vec![Item::new(-1.0, 10.0)]);
    assert!(matches!(
        Packer::new(req.clone()),
        Err(PackingError::InvalidInput(_))
    ));

    req.items = vec![Item::new(1.0, 1.0)];
    req.bin_types.clear();
    assert!(matches!(Packer::new(req), Err(PackingError::InvalidInput(_))));
}

#[cfg(not(feature = "highs"))]
#[test]
fn test_highs_backend_requires_feature() {
    let mut req = request(vec![Item::new(10.0, 10.0)]);
    req.solver.backend = SolverBackend::Highs;
    let packer = Packer::new(req).unwrap();

    assert!(matches!(
        packer.pack(),
        Err(PackingError::SolverUnavailable(_))
    ));
}

#[cfg(not(feature = "highs"))]
#[test]
fn test_no_items_skip_backend_selection() {
    let mut req = request(vec![]);
    req.solver.backend = SolverBackend::Highs;
    let result = Packer::new(req).unwrap().pack().unwrap();

    assert!(result.bins.is_empty());
    assert_eq!(result.total_cost, 0.0);
    assert_eq!(result.status, SolutionStatus::Optimal);
}

#[test]
fn test_backend_names_parse() {
    assert_eq!("microlp".parse::<SolverBackend>().unwrap(), SolverBackend::MicroLp);
    assert_eq!("HiGHS".parse::<SolverBackend>().unwrap(), SolverBackend::Highs);
    assert!(matches!(
        "gurobi".parse::<SolverBackend>(),
        Err(PackingError::SolverUnavailable(_))
    ));
    assert_eq!(SolverBackend::MicroLp.to_string(), "microlp");
}
