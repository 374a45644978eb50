//! Soft objectives, combined into one cost to minimise.
//!
//! Components:
//! 1. Gaps: idle periods sandwiched between two teaching periods.
//! 2. Workload: spread between the most and least loaded teacher.
//! 3. Distribution: a class meeting more than once a day, and uneven
//!    spread of a class over the week.
//!
//! Each component adds its own auxiliary variables and linking constraints.
//! Only components named in [`Weights`] are built.

use good_lp::{Constraint, Expression, ProblemVariables, Variable, constraint, variable};
use serde::Serialize;

use crate::config::Weights;
use crate::observe::{Event, Observer};
use crate::variables::VariableSpace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveKind {
    Gaps,
    Workload,
    Distribution,
}

impl ObjectiveKind {
    pub fn name(self) -> &'static str {
        match self {
            ObjectiveKind::Gaps => "gaps",
            ObjectiveKind::Workload => "workload",
            ObjectiveKind::Distribution => "distribution",
        }
    }
}

/// One weighted cost term and the constraints that give it meaning.
pub struct Component {
    pub kind: ObjectiveKind,
    pub weight: f64,
    pub cost: Expression,
    pub links: Vec<Constraint>,
    pub aux_variables: usize,
}

pub struct Objective {
    pub components: Vec<Component>,
}

impl Objective {
    /// `sum(weight_i * cost_i)`.
    pub fn total(&self) -> Expression {
        self.components
            .iter()
            .map(|c| c.cost.clone() * c.weight)
            .sum()
    }

    pub fn component(&self, kind: ObjectiveKind) -> Option<&Component> {
        self.components.iter().find(|c| c.kind == kind)
    }

    /// Costs to evaluate on a solution, keyed by component.
    pub fn costs(&self) -> Vec<(ObjectiveKind, f64, Expression)> {
        self.components
            .iter()
            .map(|c| (c.kind, c.weight, c.cost.clone()))
            .collect()
    }

    pub fn into_links(self) -> impl Iterator<Item = Constraint> {
        self.components.into_iter().flat_map(|c| c.links)
    }
}

pub fn compose(
    problem: &mut ProblemVariables,
    space: &VariableSpace,
    weights: &Weights,
    observer: &dyn Observer,
) -> Objective {
    let builders: [(ObjectiveKind, Option<f64>, Builder); 3] = [
        (ObjectiveKind::Gaps, weights.gaps, teacher_gaps),
        (ObjectiveKind::Workload, weights.workload, workload_balance),
        (
            ObjectiveKind::Distribution,
            weights.distribution,
            class_distribution,
        ),
    ];

    let mut components = Vec::new();
    for (kind, weight, build) in builders {
        let Some(weight) = weight else { continue };
        let part = build(problem, space);
        observer.record(Event::ObjectiveComponent {
            name: kind.name(),
            weight,
            aux_variables: part.aux_variables,
        });
        components.push(Component {
            kind,
            weight,
            cost: part.cost,
            links: part.links,
            aux_variables: part.aux_variables,
        });
    }
    Objective { components }
}

type Builder = fn(&mut ProblemVariables, &VariableSpace) -> Part;

struct Part {
    cost: Expression,
    links: Vec<Constraint>,
    aux_variables: usize,
}

/// Total number of sandwiched idle periods over all teachers and days.
///
/// For each interior period p of a day, with `teaching[p]` the number of
/// classes the teacher has at p (0 or 1):
///
///   gap[p] >= teaching[p-1] + teaching[p+1] - teaching[p] - 1
///   gap[p] <= 1 - teaching[p]
///   gap[p] <= teaching[p-1]
///   gap[p] <= teaching[p+1]
///
/// so gap[p] is 1 exactly when both neighbours teach and p does not.
fn teacher_gaps(problem: &mut ProblemVariables, space: &VariableSpace) -> Part {
    let tt = space.timetable();
    let mut gaps: Vec<Variable> = Vec::new();
    let mut links = Vec::new();

    for t in 0..tt.teachers().len() {
        for &day in tt.days() {
            let Some((first, last)) = tt.period_range(day) else {
                continue;
            };
            let teaching: Vec<Expression> = (first..=last)
                .map(|p| space.teacher_at_period(t, day, p))
                .collect();

            for i in 1..teaching.len().saturating_sub(1) {
                let gap = problem.add(variable().binary());
                let (prev, cur, next) = (&teaching[i - 1], &teaching[i], &teaching[i + 1]);
                links.push(constraint!(
                    gap + cur.clone() - prev.clone() - next.clone() >= -1
                ));
                links.push(constraint!(gap + cur.clone() <= 1));
                links.push(constraint!(gap - prev.clone() <= 0));
                links.push(constraint!(gap - next.clone() <= 0));
                gaps.push(gap);
            }
        }
    }

    Part {
        aux_variables: gaps.len(),
        cost: gaps.into_iter().sum(),
        links,
    }
}

/// `max_load - min_load` over teachers' weekly periods.
fn workload_balance(problem: &mut ProblemVariables, space: &VariableSpace) -> Part {
    let tt = space.timetable();
    let slots = tt.time_slots().len() as f64;
    let min_load = problem.add(variable().integer().min(0).max(slots));
    let max_load = problem.add(variable().integer().min(0).max(slots));

    let mut links = Vec::new();
    for t in 0..tt.teachers().len() {
        let load = space.teacher_total(t);
        links.push(constraint!(min_load - load.clone() <= 0));
        links.push(constraint!(max_load - load >= 0));
    }

    Part {
        cost: max_load - min_load,
        links,
        aux_variables: 2,
    }
}

/// Same-day repeats plus per-class day spread.
///
/// For class c and day d with `count[c,d]` periods that day:
///   excess[c,d] >= count[c,d] - 1, excess >= 0
///   max[c] >= count[c,d] >= min[c]
/// cost = sum(excess) + sum(max - min)
fn class_distribution(problem: &mut ProblemVariables, space: &VariableSpace) -> Part {
    let tt = space.timetable();
    let mut cost = Expression::from(0.0);
    let mut links = Vec::new();
    let mut aux_variables = 0;

    for (c, class) in tt.classes().iter().enumerate() {
        let bound = class.periods_per_week as f64;
        let max_day = problem.add(variable().min(0).max(bound));
        let min_day = problem.add(variable().min(0).max(bound));
        aux_variables += 2;

        for &day in tt.days() {
            let count = space.class_on_day(c, day);
            let excess = problem.add(variable().min(0));
            aux_variables += 1;

            links.push(constraint!(excess - count.clone() >= -1));
            links.push(constraint!(max_day - count.clone() >= 0));
            links.push(constraint!(min_day - count <= 0));
            cost += excess;
        }
        cost += max_day - min_day;
    }

    Part {
        cost,
        links,
        aux_variables,
    }
}
