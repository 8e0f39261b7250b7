use std::fmt;
use std::sync::Arc;

/// Immutable syntax tree. Every node records the 1-based line it starts on;
/// structurally identical trees compare equal.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub block: Block,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Expression(Expr),
    FunctionDefinition {
        name: String,
        params: Vec<String>,
        body: Arc<Block>,
        line: usize,
    },
    VariableDeclaration {
        name: String,
        value: Option<Expr>,
        line: usize,
    },
    While {
        condition: Expr,
        body: Block,
        line: usize,
    },
    If {
        condition: Expr,
        body: Block,
        else_body: Option<Block>,
        line: usize,
    },
    Assignment {
        name: String,
        value: Expr,
        line: usize,
    },
    Return {
        value: Expr,
        line: usize,
    },
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Stmt::Expression(expr) => expr.line(),
            Stmt::FunctionDefinition { line, .. } => *line,
            Stmt::VariableDeclaration { line, .. } => *line,
            Stmt::While { line, .. } => *line,
            Stmt::If { line, .. } => *line,
            Stmt::Assignment { line, .. } => *line,
            Stmt::Return { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal {
        value: i32,
        line: usize,
    },
    Identifier {
        name: String,
        line: usize,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        line: usize,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        line: usize,
    },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal { line, .. } => *line,
            Expr::Identifier { line, .. } => *line,
            Expr::Binary { line, .. } => *line,
            Expr::Call { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Multiply,
    Divide,
    Remainder,
    Add,
    Subtract,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Equal,
    NotEqual,
    Or,
    And,
}

impl BinaryOp {
    /// Apply the operator to already evaluated operands.
    ///
    /// Returns `None` for a zero divisor. Arithmetic wraps on overflow and
    /// comparisons and logical operators produce 0 or 1.
    pub fn apply(self, left: i32, right: i32) -> Option<i32> {
        let value = match self {
            BinaryOp::Multiply => left.wrapping_mul(right),
            BinaryOp::Divide => {
                if right == 0 {
                    return None;
                }
                left.wrapping_div(right)
            }
            BinaryOp::Remainder => {
                if right == 0 {
                    return None;
                }
                left.wrapping_rem(right)
            }
            BinaryOp::Add => left.wrapping_add(right),
            BinaryOp::Subtract => left.wrapping_sub(right),
            BinaryOp::Greater => i32::from(left > right),
            BinaryOp::Less => i32::from(left < right),
            BinaryOp::GreaterEqual => i32::from(left >= right),
            BinaryOp::LessEqual => i32::from(left <= right),
            BinaryOp::Equal => i32::from(left == right),
            BinaryOp::NotEqual => i32::from(left != right),
            BinaryOp::Or => i32::from(left != 0 || right != 0),
            BinaryOp::And => i32::from(left != 0 && right != 0),
        };
        Some(value)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Remainder => "%",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Greater => ">",
            BinaryOp::Less => "<",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
        }
    }
}

/// Tag of a syntax node, as shown in the debugger prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Block,
    Literal,
    Identifier,
    BinaryExpression,
    FunctionCall,
    FunctionDefinition,
    VariableDeclaration,
    WhileStatement,
    IfStatement,
    AssignmentStatement,
    ReturnStatement,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::File => "File",
            NodeKind::Block => "Block",
            NodeKind::Literal => "Literal",
            NodeKind::Identifier => "Identifier",
            NodeKind::BinaryExpression => "BinaryExpression",
            NodeKind::FunctionCall => "FunctionCall",
            NodeKind::FunctionDefinition => "FunctionDefinition",
            NodeKind::VariableDeclaration => "VariableDeclaration",
            NodeKind::WhileStatement => "WhileStatement",
            NodeKind::IfStatement => "IfStatement",
            NodeKind::AssignmentStatement => "AssignmentStatement",
            NodeKind::ReturnStatement => "ReturnStatement",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Borrowed view over any node of the tree.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    File(&'a File),
    Block(&'a Block),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

impl<'a> Node<'a> {
    pub fn line(&self) -> usize {
        match self {
            Node::File(file) => file.line,
            Node::Block(block) => block.line,
            Node::Stmt(stmt) => stmt.line(),
            Node::Expr(expr) => expr.line(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::File(_) => NodeKind::File,
            Node::Block(_) => NodeKind::Block,
            Node::Stmt(stmt) => match stmt {
                Stmt::Expression(expr) => Node::Expr(expr).kind(),
                Stmt::FunctionDefinition { .. } => NodeKind::FunctionDefinition,
                Stmt::VariableDeclaration { .. } => NodeKind::VariableDeclaration,
                Stmt::While { .. } => NodeKind::WhileStatement,
                Stmt::If { .. } => NodeKind::IfStatement,
                Stmt::Assignment { .. } => NodeKind::AssignmentStatement,
                Stmt::Return { .. } => NodeKind::ReturnStatement,
            },
            Node::Expr(expr) => match expr {
                Expr::Literal { .. } => NodeKind::Literal,
                Expr::Identifier { .. } => NodeKind::Identifier,
                Expr::Binary { .. } => NodeKind::BinaryExpression,
                Expr::Call { .. } => NodeKind::FunctionCall,
            },
        }
    }
}
