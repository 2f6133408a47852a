//! Grammar rules, split by precedence level.

mod expr;
