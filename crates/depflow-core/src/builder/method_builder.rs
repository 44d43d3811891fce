use crate::{
    body::MethodBody,
    stmt::{IdentitySource, StmtId, StmtKind},
    values::Expr,
    AnalysisError, Result,
};
use indexmap::IndexMap;

#[derive(Debug, Clone)]
struct PendingStmt {
    kind: StmtKind,
    falls_through: bool,
    jumps: Vec<String>,
}

pub struct MethodBuilder {
    name: String,
    stmts: Vec<PendingStmt>,
    labels: IndexMap<String, usize>,
    pending_labels: Vec<String>,
}

impl MethodBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stmts: Vec::new(),
            labels: IndexMap::new(),
            pending_labels: Vec::new(),
        }
    }

    /// Attaches `name` to the next statement pushed.
    pub fn label(&mut self, name: &str) -> Result<()> {
        if self.labels.contains_key(name) || self.pending_labels.iter().any(|l| l == name) {
            return Err(AnalysisError::DuplicateLabel(name.to_string()));
        }
        self.pending_labels.push(name.to_string());
        Ok(())
    }

    pub fn push(&mut self, kind: StmtKind) -> StmtId {
        let index = self.stmts.len();
        for label in self.pending_labels.drain(..) {
            self.labels.insert(label, index);
        }

        let falls_through = !matches!(
            kind,
            StmtKind::Goto | StmtKind::Switch { .. } | StmtKind::Return(_) | StmtKind::Throw(_)
        );

        self.stmts.push(PendingStmt {
            kind,
            falls_through,
            jumps: Vec::new(),
        });
        StmtId::from_index(index)
    }

    pub fn assign(&mut self, lhs: Expr, rhs: Expr) -> StmtId {
        self.push(StmtKind::Assign { lhs, rhs })
    }

    pub fn identity(&mut self, local: &str, source: IdentitySource) -> StmtId {
        self.push(StmtKind::Identity {
            local: local.to_string(),
            source,
        })
    }

    pub fn param(&mut self, local: &str, index: u32) -> StmtId {
        self.identity(local, IdentitySource::Parameter(index))
    }

    pub fn invoke(&mut self, call: Expr) -> StmtId {
        self.push(StmtKind::Invoke(call))
    }

    /// Conditional jump to `target`; falls through to the next statement otherwise.
    pub fn if_goto(&mut self, condition: Expr, target: &str) -> StmtId {
        let id = self.push(StmtKind::If { condition });
        self.stmts[id.index()].jumps.push(target.to_string());
        id
    }

    pub fn goto(&mut self, target: &str) -> StmtId {
        let id = self.push(StmtKind::Goto);
        self.stmts[id.index()].jumps.push(target.to_string());
        id
    }

    pub fn switch(&mut self, key: Expr, cases: &[&str], default: &str) -> StmtId {
        let id = self.push(StmtKind::Switch { key });
        let jumps = &mut self.stmts[id.index()].jumps;
        jumps.extend(cases.iter().map(|c| c.to_string()));
        jumps.push(default.to_string());
        id
    }

    pub fn ret(&mut self, value: Option<Expr>) -> StmtId {
        self.push(StmtKind::Return(value))
    }

    pub fn throw(&mut self, value: Expr) -> StmtId {
        self.push(StmtKind::Throw(value))
    }

    pub fn nop(&mut self) -> StmtId {
        self.push(StmtKind::Nop)
    }

    /// Replaces the fall-through edge of the last statement with an edge to `target`.
    ///
    /// Models bytecode where a loop latch flows straight back into the condition without an
    /// explicit `goto` node.
    pub fn then_jump(&mut self, target: &str) -> Result<()> {
        let last = self
            .stmts
            .last_mut()
            .ok_or_else(|| AnalysisError::NothingToRedirect(target.to_string()))?;
        last.falls_through = false;
        last.jumps.push(target.to_string());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn build(self) -> Result<MethodBody> {
        if let Some(label) = self.pending_labels.first() {
            return Err(AnalysisError::DanglingLabel(label.clone()));
        }

        let mut body = MethodBody::new(self.name);
        for pending in &self.stmts {
            body.push(pending.kind.clone());
        }

        for (label, &index) in &self.labels {
            body.set_label(StmtId::from_index(index), label.clone())?;
        }

        let count = self.stmts.len();
        for (index, pending) in self.stmts.iter().enumerate() {
            let from = StmtId::from_index(index);

            if pending.falls_through && index + 1 < count {
                body.add_edge(from, StmtId::from_index(index + 1))?;
            }

            for target in &pending.jumps {
                let &to = self
                    .labels
                    .get(target)
                    .ok_or_else(|| AnalysisError::UnknownLabel(target.clone()))?;
                body.add_edge(from, StmtId::from_index(to))?;
            }
        }

        if count > 0 {
            body.set_entry(StmtId(0))?;
        }

        Ok(body)
    }
}
