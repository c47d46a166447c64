//! Rewriting of one translation unit
//!
//! Global invariants enforced:
//! - Failures are function-scoped; a failing function contributes no edits
//! - Surviving plans have pairwise disjoint footprints
//! - Output order follows source order, independent of candidate order
//! - Identical input yields byte-for-byte identical output

use crate::descriptor::{FunctionDescriptor, MatchedFunction};
use crate::edit::{apply_edits, EditError, TextEdit};
use crate::error::{FunctionFailure, RewriteError};
use crate::plan::{RewritePlan, RewritePlanner};
use crate::symbols::SymbolTable;
use crate::wrapper::WrapperSynthesizer;
use std::collections::BTreeMap;
use tracing::debug;

/// Front-end output for one tagged function
pub type Candidate = Result<MatchedFunction, FunctionFailure>;

/// A function that was rewritten
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenFunction {
    pub name: String,
    pub mangled_name: String,
    pub line: u32,
}

/// Outcome of rewriting one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRewrite {
    /// The source with every surviving edit applied
    pub patched: String,
    /// Applied edits, against the original buffer, three per rewritten function
    pub edits: Vec<TextEdit>,
    pub rewritten: Vec<RewrittenFunction>,
    pub failures: Vec<FunctionFailure>,
}

impl UnitRewrite {
    pub fn is_unchanged(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Plans and applies the rewrites of one unit against one shared buffer
pub struct EditSequencer<'a> {
    source: &'a str,
    symbols: &'a SymbolTable,
    synthesizer: &'a WrapperSynthesizer,
}

impl<'a> EditSequencer<'a> {
    pub fn new(source: &'a str, symbols: &'a SymbolTable, synthesizer: &'a WrapperSynthesizer) -> Self {
        EditSequencer {
            source,
            symbols,
            synthesizer,
        }
    }

    pub fn run(&self, candidates: Vec<Candidate>) -> Result<UnitRewrite, EditError> {
        let mut failures = Vec::new();
        let descriptors = self.accept(candidates, &mut failures);
        let plans = self.plan_all(descriptors, &mut failures);
        let plans = reject_overlaps(plans, &mut failures);

        let edits: Vec<TextEdit> = plans
            .iter()
            .flat_map(|plan| plan.edits().into_iter().cloned())
            .collect();
        let patched = apply_edits(self.source, &edits)?;

        let rewritten = plans
            .into_iter()
            .map(|plan| RewrittenFunction {
                name: plan.function,
                mangled_name: plan.mangled_name,
                line: plan.line,
            })
            .collect();

        failures.sort_by(|a, b| {
            a.line
                .cmp(&b.line)
                .then_with(|| a.error.function().cmp(b.error.function()))
        });

        Ok(UnitRewrite {
            patched,
            edits,
            rewritten,
            failures,
        })
    }

    /// Validate candidates into descriptors and reject duplicate names
    fn accept(&self, candidates: Vec<Candidate>, failures: &mut Vec<FunctionFailure>) -> Vec<FunctionDescriptor> {
        let mut descriptors = Vec::new();
        for candidate in candidates {
            let result = candidate.and_then(|matched| {
                let line = matched.line;
                FunctionDescriptor::try_from(matched).map_err(|error| FunctionFailure::new(line, error))
            });
            match result {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(failure) => failures.push(failure),
            }
        }

        let mut per_name: BTreeMap<&str, usize> = BTreeMap::new();
        for descriptor in &descriptors {
            *per_name.entry(descriptor.name()).or_default() += 1;
        }
        let overloaded: Vec<String> = per_name
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| name.to_string())
            .collect();

        let (kept, rejected): (Vec<_>, Vec<_>) = descriptors
            .into_iter()
            .partition(|d| !overloaded.iter().any(|name| name == d.name()));
        for descriptor in rejected {
            failures.push(FunctionFailure::new(
                descriptor.line(),
                RewriteError::OverloadedName {
                    function: descriptor.name().to_string(),
                },
            ));
        }

        kept
    }

    fn plan_all(&self, descriptors: Vec<FunctionDescriptor>, failures: &mut Vec<FunctionFailure>) -> Vec<RewritePlan> {
        let planner = RewritePlanner::new(self.source, self.symbols, self.synthesizer);
        let mut plans = Vec::new();
        for descriptor in descriptors {
            match planner.plan(&descriptor) {
                Ok(plan) => {
                    debug!(function = %plan.function, mangled = %plan.mangled_name, "planned rewrite");
                    plans.push(plan);
                }
                Err(error) => failures.push(FunctionFailure::new(descriptor.line(), error)),
            }
        }
        plans
    }
}

/// Drop every plan whose footprint overlaps another plan's
fn reject_overlaps(mut plans: Vec<RewritePlan>, failures: &mut Vec<FunctionFailure>) -> Vec<RewritePlan> {
    plans.sort_by_key(|plan| (plan.footprint.start, plan.footprint.end));

    let mut conflicting: BTreeMap<usize, String> = BTreeMap::new();
    for (i, plan) in plans.iter().enumerate() {
        for (j, later) in plans.iter().enumerate().skip(i + 1) {
            // Sorted by start, so the first disjoint successor ends the scan
            if !plan.footprint.overlaps(&later.footprint) {
                break;
            }
            conflicting.entry(i).or_insert_with(|| later.function.clone());
            conflicting.entry(j).or_insert_with(|| plan.function.clone());
        }
    }

    let mut kept = Vec::with_capacity(plans.len());
    for (i, plan) in plans.into_iter().enumerate() {
        match conflicting.remove(&i) {
            Some(other) => failures.push(FunctionFailure::new(
                plan.line,
                RewriteError::OverlappingMatch {
                    function: plan.function,
                    other,
                },
            )),
            None => kept.push(plan),
        }
    }
    kept
}

/// Rewrite `source` from descriptors supplied by an external front end
///
/// Mangled names are checked against every identifier-shaped token of the
/// source.
pub fn rewrite_descriptors(
    source: &str,
    functions: Vec<MatchedFunction>,
    synthesizer: &WrapperSynthesizer,
) -> Result<UnitRewrite, EditError> {
    let symbols = SymbolTable::scan(source);
    EditSequencer::new(source, &symbols, synthesizer).run(functions.into_iter().map(Ok).collect())
}
