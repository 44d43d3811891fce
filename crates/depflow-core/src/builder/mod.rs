/*! Fluent construction of method bodies.
 *
 * Wiring successor lists by hand is tedious and easy to get wrong. The builder appends statements in
 * program order, links fall-through edges automatically and resolves jump labels when the body is
 * finished.
 */

pub mod method_builder;

pub use method_builder::MethodBuilder;
