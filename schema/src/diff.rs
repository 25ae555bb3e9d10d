//! Blueprint-vs-introspected diffing.
//!
//! Produces the ordered command list for one alter: drops first (indexes
//! then columns), then modifies, then adds (columns then indexes), then
//! renames. That order minimizes the window in which constraints can
//! reject intermediate states.

use crate::blueprint::Blueprint;
use crate::types::{Command, CommandKind, Table};

/// The outcome of diffing a blueprint against the current table shape:
/// the declared target table (the DDL compilers resolve command payloads
/// against it) and the ordered commands.
#[derive(Debug)]
pub struct TableDiff {
    pub table: Table,
    pub commands: Vec<Command>,
}

impl TableDiff {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Diffs `blueprint` against `current`.
///
/// - declared columns absent from `current` become `AddColumn`;
/// - declared columns with a `.change()` mark whose shape differs become
///   `ModifyColumn` (a change mark on a missing column is a no-op);
/// - explicit drop/rename commands pass through;
/// - declared indexes are compared by (name, type, columns) signature: a
///   missing signature becomes `CreateIndex`, a name collision with a
///   different signature becomes `DropIndex` + `CreateIndex`. Indexes the
///   blueprint does not mention are left alone, like unmentioned columns.
pub fn diff(mut blueprint: Blueprint, current: &Table) -> TableDiff {
    let mut drops: Vec<Command> = Vec::new();
    let mut modifies: Vec<Command> = Vec::new();
    let mut adds: Vec<Command> = Vec::new();
    let mut add_indexes: Vec<Command> = Vec::new();
    let mut renames: Vec<Command> = Vec::new();

    for command in blueprint.table.commands.drain(..) {
        match &command.kind {
            CommandKind::DropIndex(_) => drops.insert(index_drop_slot(&drops), command),
            CommandKind::DropColumn(_) | CommandKind::DropPrimary => drops.push(command),
            CommandKind::AddColumn(name) => {
                let name = name.clone();
                let Some(declared) = blueprint.table.columns.get(&name) else {
                    continue;
                };
                match current.get_column(&name) {
                    // Already there: a change mark means modify, an
                    // identical shape means nothing at all.
                    Some(existing) => {
                        if declared.change && declared.shape_differs(existing) {
                            modifies.push(retag(command, CommandKind::ModifyColumn(name)));
                        }
                    }
                    None => adds.push(command),
                }
            }
            CommandKind::ModifyColumn(name) => {
                let differs = match (blueprint.table.columns.get(name), current.get_column(name)) {
                    (Some(declared), Some(existing)) => declared.shape_differs(existing),
                    _ => false,
                };
                if differs {
                    modifies.push(command);
                }
            }
            CommandKind::CreateIndex(name) => {
                let Some(declared) = blueprint.table.indexes.get(name) else {
                    continue;
                };
                match current.get_index(name) {
                    Some(existing) if existing.signature() == declared.signature() => {}
                    Some(_) => {
                        drops.insert(
                            index_drop_slot(&drops),
                            Command::new(CommandKind::DropIndex(name.clone())),
                        );
                        add_indexes.push(command);
                    }
                    None => add_indexes.push(command),
                }
            }
            CommandKind::CreatePrimary => {
                let declared = blueprint.table.primary.as_ref().map(|p| &p.columns);
                let existing = current.primary.as_ref().map(|p| &p.columns);
                if declared != existing {
                    add_indexes.push(command);
                }
            }
            CommandKind::RenameColumn { .. } | CommandKind::RenameIndex { .. } => {
                renames.push(command);
            }
        }
    }

    let mut commands = drops;
    commands.extend(modifies);
    commands.extend(adds);
    commands.extend(add_indexes);
    commands.extend(renames);

    TableDiff {
        table: blueprint.table,
        commands,
    }
}

/// Index drops precede column drops inside the drop block.
fn index_drop_slot(drops: &[Command]) -> usize {
    drops
        .iter()
        .position(|c| !matches!(c.kind, CommandKind::DropIndex(_)))
        .unwrap_or(drops.len())
}

fn retag(command: Command, kind: CommandKind) -> Command {
    let mut command = command;
    command.kind = kind;
    command
}
