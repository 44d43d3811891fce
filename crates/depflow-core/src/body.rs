use crate::analysis::cfg::{find_entry, StmtGraph};
use crate::stmt::{Stmt, StmtId, StmtKind};
use crate::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Arena of statements for one method, with explicit successor and predecessor lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodBody {
    pub name: String,
    stmts: Vec<Stmt>,
    successors: Vec<Vec<StmtId>>,
    predecessors: Vec<Vec<StmtId>>,
    entry: Option<StmtId>,
}

impl MethodBody {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, kind: StmtKind) -> StmtId {
        let id = StmtId::from_index(self.stmts.len());
        self.stmts.push(Stmt::new(id, kind));
        self.successors.push(Vec::new());
        self.predecessors.push(Vec::new());
        id
    }

    pub fn set_label(&mut self, id: StmtId, label: impl Into<String>) -> Result<()> {
        let stmt = self
            .stmts
            .get_mut(id.index())
            .ok_or(AnalysisError::InvalidStatement(id))?;
        stmt.label = Some(label.into());
        Ok(())
    }

    pub fn add_edge(&mut self, from: StmtId, to: StmtId) -> Result<()> {
        for id in [from, to] {
            if id.index() >= self.stmts.len() {
                return Err(AnalysisError::InvalidStatement(id));
            }
        }

        let succs = &mut self.successors[from.index()];
        if !succs.contains(&to) {
            succs.push(to);
            self.predecessors[to.index()].push(from);
        }
        Ok(())
    }

    pub fn set_entry(&mut self, entry: StmtId) -> Result<()> {
        if entry.index() >= self.stmts.len() {
            return Err(AnalysisError::InvalidStatement(entry));
        }
        self.entry = Some(entry);
        Ok(())
    }

    pub fn declared_entry(&self) -> Option<StmtId> {
        self.entry
    }

    pub fn stmts(&self) -> &[Stmt] {
        &self.stmts
    }

    pub fn get(&self, id: StmtId) -> Option<&Stmt> {
        self.stmts.get(id.index())
    }

    pub fn find_label(&self, label: &str) -> Option<StmtId> {
        self.stmts
            .iter()
            .find(|s| s.label.as_deref() == Some(label))
            .map(|s| s.id)
    }

    pub fn edge_count(&self) -> usize {
        self.successors.iter().map(Vec::len).sum()
    }

    /// Same statements with every edge flipped. The entry is left undeclared.
    pub fn reversed(&self) -> MethodBody {
        Self {
            name: format!("{}$reversed", self.name),
            stmts: self.stmts.clone(),
            successors: self.predecessors.clone(),
            predecessors: self.successors.clone(),
            entry: None,
        }
    }
}

impl StmtGraph for MethodBody {
    fn len(&self) -> usize {
        self.stmts.len()
    }

    fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    fn successors(&self, id: StmtId) -> &[StmtId] {
        self.successors
            .get(id.index())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    fn predecessors(&self, id: StmtId) -> &[StmtId] {
        self.predecessors
            .get(id.index())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    fn entry(&self) -> Option<StmtId> {
        self.entry.or_else(|| find_entry(self))
    }
}
