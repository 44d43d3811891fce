use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Cmp,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Cmp => "cmp",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Cmp
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    Int(i64),
    /// Stored as raw bits so constants stay `Eq + Hash`.
    Float(u64),
    Bool(bool),
    Str(String),
    Null,
}

impl Constant {
    pub fn float(value: f64) -> Self {
        Constant::Float(value.to_bits())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Constant::Int(v) => Some(*v),
            _ => None,
        }
    }
}

/// Expression tree for statement operands.
///
/// The set of variants is closed: the def/use walker matches on it exhaustively, so adding a
/// variant forces every analysis to decide how the new shape contributes variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    Local(String),
    Constant(Constant),
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Field {
        base: Box<Expr>,
        field: String,
    },
    StaticField {
        class: String,
        field: String,
    },
    ArrayElem {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Cast {
        ty: String,
        operand: Box<Expr>,
    },
    Length(Box<Expr>),
    New(String),
    NewArray {
        elem: String,
        size: Box<Expr>,
    },
    Call {
        receiver: Option<Box<Expr>>,
        method: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn local(name: impl Into<String>) -> Self {
        Expr::Local(name.into())
    }

    pub fn int(value: i64) -> Self {
        Expr::Constant(Constant::Int(value))
    }

    pub fn binop(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::BinOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn add(left: Expr, right: Expr) -> Self {
        Self::binop(BinOp::Add, left, right)
    }

    pub fn sub(left: Expr, right: Expr) -> Self {
        Self::binop(BinOp::Sub, left, right)
    }

    pub fn mul(left: Expr, right: Expr) -> Self {
        Self::binop(BinOp::Mul, left, right)
    }

    pub fn field(base: Expr, field: impl Into<String>) -> Self {
        Expr::Field {
            base: Box::new(base),
            field: field.into(),
        }
    }

    pub fn array_elem(base: Expr, index: Expr) -> Self {
        Expr::ArrayElem {
            base: Box::new(base),
            index: Box::new(index),
        }
    }

    pub fn cast(ty: impl Into<String>, operand: Expr) -> Self {
        Expr::Cast {
            ty: ty.into(),
            operand: Box::new(operand),
        }
    }

    pub fn length(operand: Expr) -> Self {
        Expr::Length(Box::new(operand))
    }

    pub fn call(receiver: Option<Expr>, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            receiver: receiver.map(Box::new),
            method: method.into(),
            args,
        }
    }

    pub fn static_call(method: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::call(None, method, args)
    }

    pub fn as_local(&self) -> Option<&str> {
        match self {
            Expr::Local(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Expr::Constant(c) => c.as_int(),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Constant(_))
    }

    /// Root variable of an access path: `a` for `a`, `a.f`, `a[i]` and `(T) a`.
    ///
    /// Two access paths name the same storage location iff their roots are equal. This ignores
    /// field names and subscripts on purpose and does no alias reasoning.
    pub fn root_name(&self) -> Option<&str> {
        let mut current = self;
        loop {
            match current {
                Expr::Local(name) => return Some(name),
                Expr::Field { base, .. } | Expr::ArrayElem { base, .. } => current = base,
                Expr::Cast { operand, .. } => current = operand,
                _ => return None,
            }
        }
    }
}
