//! Planning half of recipe reconciliation.
//!
//! These functions only compute what has to change; `recipe_service` applies the
//! resulting plans inside a transaction. Keeping them free of I/O lets every
//! create/update path validate the whole request before the first write.

use std::collections::HashSet;

use crate::{
    dto::recipes::IngredientAmount,
    entity::recipe_ingredients,
    error::{AppError, AppResult},
};

/// Persisted ingredient line as seen by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingLine {
    pub id: i64,
    pub ingredient_id: i64,
    pub amount: i32,
}

impl From<&recipe_ingredients::Model> for ExistingLine {
    fn from(model: &recipe_ingredients::Model) -> Self {
        Self {
            id: model.id,
            ingredient_id: model.ingredient_id,
            amount: model.amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewLine {
    pub ingredient_id: i64,
    pub amount: i32,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinePlan {
    /// Line ids left untouched.
    pub keep: Vec<i64>,
    /// Lines to insert.
    pub create: Vec<NewLine>,
    /// Line ids to delete.
    pub delete: Vec<i64>,
}

impl LinePlan {
    pub fn is_noop(&self) -> bool {
        self.create.is_empty() && self.delete.is_empty()
    }

    pub fn ingredient_ids_to_create(&self) -> Vec<i64> {
        self.create.iter().map(|line| line.ingredient_id).collect()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagDiff {
    pub attach: Vec<i64>,
    pub detach: Vec<i64>,
}

impl TagDiff {
    pub fn is_noop(&self) -> bool {
        self.attach.is_empty() && self.detach.is_empty()
    }
}

/// Removes repeated ids, keeping the first occurrence order.
pub fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Tags shared by both sides are neither detached nor re-attached.
pub fn diff_tags(current: &[i64], requested: &[i64]) -> TagDiff {
    let current_set: HashSet<i64> = current.iter().copied().collect();
    let requested = dedup_ids(requested);
    let requested_set: HashSet<i64> = requested.iter().copied().collect();

    TagDiff {
        attach: requested
            .into_iter()
            .filter(|id| !current_set.contains(id))
            .collect(),
        detach: dedup_ids(current)
            .into_iter()
            .filter(|id| !requested_set.contains(id))
            .collect(),
    }
}

/// Resolves every requested line against the recipe's current lines.
///
/// A requested `id` is matched, in order, as:
/// 1. the id of a current line carrying the same amount (kept),
/// 2. the ingredient of a current line carrying the same amount (kept),
/// 3. an ingredient id for a new line.
///
/// Current lines whose ingredient is not kept by any requested item are deleted.
/// Two requested items resolving to the same ingredient fail the whole plan.
pub fn plan_lines(current: &[ExistingLine], requested: &[IngredientAmount]) -> AppResult<LinePlan> {
    if let Some(item) = requested.iter().find(|item| item.amount < 1) {
        return Err(AppError::Validation(format!(
            "Amount for ingredient {} must be at least 1",
            item.id
        )));
    }

    let mut plan = LinePlan::default();
    let mut resolved_ingredients: HashSet<i64> = HashSet::with_capacity(requested.len());
    let mut satisfied: HashSet<i64> = HashSet::new();

    for item in requested {
        let existing = current
            .iter()
            .find(|line| line.id == item.id && line.amount == item.amount)
            .or_else(|| {
                current
                    .iter()
                    .find(|line| line.ingredient_id == item.id && line.amount == item.amount)
            });

        let ingredient_id = existing.map_or(item.id, |line| line.ingredient_id);
        if !resolved_ingredients.insert(ingredient_id) {
            return Err(AppError::Validation(format!(
                "Duplicate ingredient {ingredient_id} in recipe"
            )));
        }

        match existing {
            Some(line) => {
                satisfied.insert(line.ingredient_id);
                plan.keep.push(line.id);
            }
            None => plan.create.push(NewLine {
                ingredient_id,
                amount: item.amount,
            }),
        }
    }

    plan.delete = current
        .iter()
        .filter(|line| !satisfied.contains(&line.ingredient_id))
        .map(|line| line.id)
        .collect();

    Ok(plan)
}
