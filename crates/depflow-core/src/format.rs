use crate::{
    analysis::cfg::StmtGraph,
    body::MethodBody,
    stmt::{IdentitySource, Stmt, StmtKind},
    values::{Constant, Expr},
};
use std::fmt::{self, Write};

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{}", v),
            Constant::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::Str(s) => write!(f, "{:?}", s),
            Constant::Null => write!(f, "null"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Local(name) => write!(f, "{}", name),
            Expr::Constant(c) => write!(f, "{}", c),
            Expr::BinOp { op, left, right } => write!(f, "{} {} {}", left, op.symbol(), right),
            Expr::Field { base, field } => write!(f, "{}.{}", base, field),
            Expr::StaticField { class, field } => write!(f, "{}.{}", class, field),
            Expr::ArrayElem { base, index } => write!(f, "{}[{}]", base, index),
            Expr::Cast { ty, operand } => write!(f, "({}) {}", ty, operand),
            Expr::Length(operand) => write!(f, "lengthof {}", operand),
            Expr::New(class) => write!(f, "new {}", class),
            Expr::NewArray { elem, size } => write!(f, "newarray ({})[{}]", elem, size),
            Expr::Call {
                receiver,
                method,
                args,
            } => {
                if let Some(receiver) = receiver {
                    write!(f, "{}.", receiver)?;
                }
                write!(f, "{}(", method)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for StmtKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StmtKind::Assign { lhs, rhs } => write!(f, "{} = {}", lhs, rhs),
            StmtKind::Identity { local, source } => match source {
                IdentitySource::This => write!(f, "{} := @this", local),
                IdentitySource::Parameter(n) => write!(f, "{} := @parameter{}", local, n),
                IdentitySource::CaughtException => write!(f, "{} := @caughtexception", local),
            },
            StmtKind::If { condition } => write!(f, "if {}", condition),
            StmtKind::Goto => write!(f, "goto"),
            StmtKind::Switch { key } => write!(f, "switch({})", key),
            StmtKind::Invoke(call) => write!(f, "{}", call),
            StmtKind::Return(Some(value)) => write!(f, "return {}", value),
            StmtKind::Return(None) => write!(f, "return"),
            StmtKind::Throw(value) => write!(f, "throw {}", value),
            StmtKind::Nop => write!(f, "nop"),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.kind)
    }
}

pub fn format_body(body: &MethodBody) -> String {
    let mut output = String::new();

    writeln!(&mut output, "method {}", body.name).unwrap();
    for stmt in body.stmts() {
        if let Some(label) = &stmt.label {
            writeln!(&mut output, "{}:", label).unwrap();
        }
        write!(&mut output, "    {}", stmt).unwrap();

        let succs = body.successors(stmt.id);
        if !succs.is_empty() {
            write!(&mut output, "  ->").unwrap();
            for succ in succs {
                write!(&mut output, " {}", succ).unwrap();
            }
        }
        writeln!(&mut output).unwrap();
    }

    output
}
