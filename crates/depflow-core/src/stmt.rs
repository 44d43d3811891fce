use crate::values::Expr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StmtId(pub u32);

impl StmtId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn from_index(index: usize) -> Self {
        StmtId(index as u32)
    }
}

impl std::fmt::Display for StmtId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stmt {
    pub id: StmtId,
    pub kind: StmtKind,
    pub label: Option<String>,
}

impl Stmt {
    pub fn new(id: StmtId, kind: StmtKind) -> Self {
        Self {
            id,
            kind,
            label: None,
        }
    }

    pub fn is_assignment(&self) -> bool {
        matches!(self.kind, StmtKind::Assign { .. })
    }

    pub fn is_identity(&self) -> bool {
        matches!(self.kind, StmtKind::Identity { .. })
    }

    /// Conditional and unconditional jumps. Successor count is checked separately by callers.
    pub fn is_jump(&self) -> bool {
        matches!(
            self.kind,
            StmtKind::If { .. } | StmtKind::Goto | StmtKind::Switch { .. }
        )
    }

    pub fn is_exit(&self) -> bool {
        matches!(self.kind, StmtKind::Return(_) | StmtKind::Throw(_))
    }

    pub fn lhs(&self) -> Option<&Expr> {
        match &self.kind {
            StmtKind::Assign { lhs, .. } => Some(lhs),
            _ => None,
        }
    }

    pub fn rhs(&self) -> Option<&Expr> {
        match &self.kind {
            StmtKind::Assign { rhs, .. } => Some(rhs),
            _ => None,
        }
    }

    /// Expressions read by the statement outside of an assignment target.
    pub fn operands(&self) -> Vec<&Expr> {
        match &self.kind {
            StmtKind::Assign { rhs, .. } => vec![rhs],
            StmtKind::If { condition } => vec![condition],
            StmtKind::Switch { key } => vec![key],
            StmtKind::Invoke(call) => vec![call],
            StmtKind::Return(Some(value)) => vec![value],
            StmtKind::Throw(value) => vec![value],
            StmtKind::Return(None)
            | StmtKind::Identity { .. }
            | StmtKind::Goto
            | StmtKind::Nop => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StmtKind {
    Assign { lhs: Expr, rhs: Expr },
    Identity { local: String, source: IdentitySource },
    If { condition: Expr },
    Goto,
    Switch { key: Expr },
    Invoke(Expr),
    Return(Option<Expr>),
    Throw(Expr),
    Nop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentitySource {
    This,
    Parameter(u32),
    CaughtException,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operands_exclude_assignment_target() {
        let stmt = Stmt::new(
            StmtId(0),
            StmtKind::Assign {
                lhs: Expr::array_elem(Expr::local("a"), Expr::local("i")),
                rhs: Expr::local("x"),
            },
        );

        assert_eq!(stmt.operands(), vec![&Expr::local("x")]);
        assert!(stmt.lhs().is_some());
        assert!(!stmt.is_jump());
    }

    #[test]
    fn test_jump_classification() {
        let branch = Stmt::new(
            StmtId(1),
            StmtKind::If {
                condition: Expr::local("c"),
            },
        );
        let goto = Stmt::new(StmtId(2), StmtKind::Goto);
        let ret = Stmt::new(StmtId(3), StmtKind::Return(None));

        assert!(branch.is_jump());
        assert!(goto.is_jump());
        assert!(!ret.is_jump());
        assert!(ret.is_exit());
    }
}
