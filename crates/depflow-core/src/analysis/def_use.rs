use crate::{
    analysis::cfg::StmtGraph,
    stmt::{Stmt, StmtId, StmtKind},
    values::Expr,
};
use serde::Serialize;
use std::collections::BTreeSet;

/// Variables and structured values one statement defines and uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StmtDefUse {
    pub defs: BTreeSet<String>,
    pub uses: BTreeSet<String>,
    pub def_values: Vec<Expr>,
    pub use_values: Vec<Expr>,
    /// `(array root, index)` for an element written by the statement.
    pub array_writes: Vec<(String, Expr)>,
    /// `(array root, index)` for every element read by the statement.
    pub array_reads: Vec<(String, Expr)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DefUseSets {
    per_stmt: Vec<StmtDefUse>,
}

impl DefUseSets {
    pub fn compute<G: StmtGraph + ?Sized>(graph: &G) -> Self {
        let per_stmt = graph
            .stmt_ids()
            .map(|id| Self::extract(graph.stmt(id)))
            .collect();
        Self { per_stmt }
    }

    pub fn extract(stmt: &Stmt) -> StmtDefUse {
        let mut result = StmtDefUse::default();

        match &stmt.kind {
            StmtKind::Assign { lhs, .. } => {
                if let Some(root) = lhs.root_name() {
                    result.defs.insert(root.to_string());
                }
                result.def_values.push(lhs.clone());

                match lhs {
                    Expr::ArrayElem { base, index } => {
                        collect_uses(base, &mut result);
                        collect_uses(index, &mut result);
                        result.use_values.push((**base).clone());
                        result.use_values.push((**index).clone());
                        if let Some(root) = base.root_name() {
                            result
                                .array_writes
                                .push((root.to_string(), (**index).clone()));
                        }
                    }
                    Expr::Field { base, .. } => {
                        collect_uses(base, &mut result);
                        result.use_values.push((**base).clone());
                    }
                    _ => {}
                }
            }
            StmtKind::Identity { local, .. } => {
                result.defs.insert(local.clone());
                result.def_values.push(Expr::Local(local.clone()));
            }
            _ => {}
        }

        for operand in stmt.operands() {
            collect_uses(operand, &mut result);
            result.use_values.push(operand.clone());
        }

        result
    }

    pub fn get(&self, stmt: StmtId) -> Option<&StmtDefUse> {
        self.per_stmt.get(stmt.index())
    }

    pub fn defs(&self, stmt: StmtId) -> &BTreeSet<String> {
        &self.per_stmt[stmt.index()].defs
    }

    pub fn uses(&self, stmt: StmtId) -> &BTreeSet<String> {
        &self.per_stmt[stmt.index()].uses
    }

    pub fn def_values(&self, stmt: StmtId) -> &[Expr] {
        &self.per_stmt[stmt.index()].def_values
    }

    pub fn use_values(&self, stmt: StmtId) -> &[Expr] {
        &self.per_stmt[stmt.index()].use_values
    }

    pub fn defines(&self, stmt: StmtId, var: &str) -> bool {
        self.defs(stmt).contains(var)
    }

    pub fn uses_var(&self, stmt: StmtId, var: &str) -> bool {
        self.uses(stmt).contains(var)
    }

    pub fn has_defs(&self, stmt: StmtId) -> bool {
        !self.defs(stmt).is_empty()
    }

    /// True when the two statements define at least one common variable.
    pub fn defs_overlap(&self, a: StmtId, b: StmtId) -> bool {
        !self.defs(a).is_disjoint(self.defs(b))
    }

    pub fn definitions_of(&self, var: &str) -> Vec<StmtId> {
        self.stmts_where(|du| du.defs.contains(var))
    }

    pub fn uses_of(&self, var: &str) -> Vec<StmtId> {
        self.stmts_where(|du| du.uses.contains(var))
    }

    /// Index expressions of the elements of `array` written by `stmt`.
    pub fn array_write_indices<'a>(
        &'a self,
        stmt: StmtId,
        array: &'a str,
    ) -> impl Iterator<Item = &'a Expr> + 'a {
        indices_of(&self.per_stmt[stmt.index()].array_writes, array)
    }

    /// Index expressions of every element of `array` read by `stmt`, in no particular order.
    pub fn array_read_indices<'a>(
        &'a self,
        stmt: StmtId,
        array: &'a str,
    ) -> impl Iterator<Item = &'a Expr> + 'a {
        indices_of(&self.per_stmt[stmt.index()].array_reads, array)
    }

    pub fn len(&self) -> usize {
        self.per_stmt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_stmt.is_empty()
    }

    fn stmts_where(&self, pred: impl Fn(&StmtDefUse) -> bool) -> Vec<StmtId> {
        self.per_stmt
            .iter()
            .enumerate()
            .filter(|(_, du)| pred(du))
            .map(|(i, _)| StmtId::from_index(i))
            .collect()
    }
}

fn indices_of<'a>(
    accesses: &'a [(String, Expr)],
    array: &'a str,
) -> impl Iterator<Item = &'a Expr> + 'a {
    accesses
        .iter()
        .filter(move |(root, _)| root == array)
        .map(|(_, index)| index)
}

/// Adds every variable read by evaluating `expr`, and every array element it loads.
fn collect_uses(expr: &Expr, out: &mut StmtDefUse) {
    let mut stack = vec![expr];

    while let Some(expr) = stack.pop() {
        match expr {
            Expr::Local(name) => {
                out.uses.insert(name.clone());
            }
            Expr::BinOp { left, right, .. } => {
                stack.push(left);
                stack.push(right);
            }
            Expr::Field { base, .. } => stack.push(base),
            Expr::ArrayElem { base, index } => {
                if let Some(root) = base.root_name() {
                    out.array_reads.push((root.to_string(), (**index).clone()));
                }
                stack.push(base);
                stack.push(index);
            }
            Expr::Cast { operand, .. } | Expr::Length(operand) => stack.push(operand),
            Expr::Call { receiver, args, .. } => {
                stack.extend(args.iter());
                if let Some(receiver) = receiver {
                    stack.push(receiver);
                }
            }
            // Allocation operands are literals at this level; static fields have no local root.
            Expr::New(_) | Expr::NewArray { .. } | Expr::StaticField { .. } | Expr::Constant(_) => {
            }
        }
    }
}
