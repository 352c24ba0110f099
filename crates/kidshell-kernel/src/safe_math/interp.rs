//! Compile parsed expressions against their inputs, then run them on a budget.
//!
//! Compilation resolves every name once: to a bound value (caller variables
//! over constants) or to an allowlisted function. A compiled program therefore
//! depends on the inputs it was built with, which is why the evaluator cache
//! keys on them.

use std::collections::HashMap;
use std::time::Instant;

use super::ast::{BinaryOp, CompareOp, Expr, LogicalOp, UnaryOp};
use super::builtins::Builtin;
use super::value::{binary_op, compare, negate, positive, MathValue};
use super::{EvaluatorLimits, SafeMathError};

/// Name to value bindings visible to one evaluation.
pub(crate) type Inputs = HashMap<String, MathValue>;

#[derive(Debug)]
enum Node {
    Const(MathValue),
    List(Vec<Node>),
    Unary(UnaryOp, Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    Compare(Box<Node>, Vec<(CompareOp, Node)>),
    Logical(LogicalOp, Box<Node>, Box<Node>),
    Call(Builtin, Vec<Node>),
}

/// An expression with all names resolved.
#[derive(Debug)]
pub struct Compiled {
    root: Node,
}

pub(crate) fn compile(expr: &Expr, inputs: &Inputs) -> Result<Compiled, SafeMathError> {
    Ok(Compiled {
        root: lower(expr, inputs)?,
    })
}

fn lower(expr: &Expr, inputs: &Inputs) -> Result<Node, SafeMathError> {
    let lower_all = |items: &[Expr]| -> Result<Vec<Node>, SafeMathError> {
        items.iter().map(|item| lower(item, inputs)).collect()
    };

    Ok(match expr {
        Expr::Int(i) => Node::Const(MathValue::Int(*i)),
        Expr::Float(f) => Node::Const(MathValue::Float(*f)),
        Expr::Str(s) => Node::Const(MathValue::Str(s.clone())),
        Expr::Bool(b) => Node::Const(MathValue::Bool(*b)),
        Expr::Name(name) => match inputs.get(name) {
            Some(value) => Node::Const(value.clone()),
            None if Builtin::from_name(name).is_some() => {
                return Err(SafeMathError::InvalidExpression(format!(
                    "'{name}' is a function, try {name}(...)"
                )))
            }
            None => return Err(SafeMathError::UnknownName(name.clone())),
        },
        Expr::List(items) => Node::List(lower_all(items)?),
        Expr::Unary { op, operand } => Node::Unary(*op, Box::new(lower(operand, inputs)?)),
        Expr::Binary { op, left, right } => Node::Binary(
            *op,
            Box::new(lower(left, inputs)?),
            Box::new(lower(right, inputs)?),
        ),
        Expr::Compare { first, rest } => Node::Compare(
            Box::new(lower(first, inputs)?),
            rest.iter()
                .map(|(op, rhs)| Ok((*op, lower(rhs, inputs)?)))
                .collect::<Result<_, SafeMathError>>()?,
        ),
        Expr::Logical { op, left, right } => Node::Logical(
            *op,
            Box::new(lower(left, inputs)?),
            Box::new(lower(right, inputs)?),
        ),
        Expr::Call { name, args } => {
            if let Some(value) = inputs.get(name) {
                return Err(SafeMathError::InvalidExpression(format!(
                    "'{}' object is not callable",
                    value.type_name()
                )));
            }
            let builtin =
                Builtin::from_name(name).ok_or_else(|| SafeMathError::UnknownName(name.clone()))?;
            Node::Call(builtin, lower_all(args)?)
        }
    })
}

/// Resource meter for one run: steps against the deadline, values against
/// the allocation and memory caps.
pub(crate) struct Budget {
    limits: EvaluatorLimits,
    deadline: Instant,
    steps: u64,
    allocations: u64,
    bytes: usize,
}

impl Budget {
    /// The clock is sampled on the first step and every 32 after it.
    const CLOCK_INTERVAL: u64 = 32;

    pub(crate) fn new(limits: &EvaluatorLimits) -> Self {
        Self {
            limits: *limits,
            deadline: Instant::now() + limits.max_duration(),
            steps: 0,
            allocations: 0,
            bytes: 0,
        }
    }

    fn tick(&mut self) -> Result<(), SafeMathError> {
        self.steps += 1;
        if self.steps % Self::CLOCK_INTERVAL == 1 && Instant::now() >= self.deadline {
            return Err(SafeMathError::Timeout);
        }
        Ok(())
    }

    fn charge(&mut self, value: &MathValue) -> Result<(), SafeMathError> {
        self.allocations += 1;
        self.bytes = self.bytes.saturating_add(value.heap_size());
        if self.allocations > self.limits.max_allocations || self.bytes > self.limits.max_memory_bytes
        {
            return Err(SafeMathError::MemoryLimit);
        }
        Ok(())
    }

    fn remaining_bytes(&self) -> usize {
        self.limits.max_memory_bytes.saturating_sub(self.bytes)
    }
}

impl Compiled {
    pub(crate) fn run(&self, budget: &mut Budget) -> Result<MathValue, SafeMathError> {
        eval(&self.root, budget)
    }
}

fn eval(node: &Node, budget: &mut Budget) -> Result<MathValue, SafeMathError> {
    budget.tick()?;

    let value = match node {
        Node::Const(value) => value.clone(),
        Node::List(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(eval(item, budget)?);
            }
            MathValue::List(values)
        }
        Node::Unary(op, operand) => {
            let value = eval(operand, budget)?;
            match op {
                UnaryOp::Neg => negate(&value)?,
                UnaryOp::Pos => positive(&value)?,
                UnaryOp::Not => MathValue::Bool(!value.truthy()),
            }
        }
        Node::Binary(op, left, right) => {
            let left = eval(left, budget)?;
            let right = eval(right, budget)?;
            binary_op(*op, &left, &right, budget.remaining_bytes())?
        }
        Node::Compare(first, rest) => {
            let mut left = eval(first, budget)?;
            let mut holds = true;
            for (op, rhs) in rest {
                let right = eval(rhs, budget)?;
                if !compare(*op, &left, &right)? {
                    holds = false;
                    break;
                }
                left = right;
            }
            MathValue::Bool(holds)
        }
        Node::Logical(op, left, right) => {
            let left = eval(left, budget)?;
            match (op, left.truthy()) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => left,
                _ => eval(right, budget)?,
            }
        }
        Node::Call(builtin, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval(arg, budget)?);
            }
            builtin.call(&values, budget.remaining_bytes())?
        }
    };

    budget.charge(&value)?;
    Ok(value)
}
