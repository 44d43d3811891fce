/*! Cross-module checks of the analysis pipeline.
 *
 * Each analysis has unit tests beside it. These tests run whole method bodies through several stages
 * at once and check the properties that tie the stages together: dominance laws, post-dominance as
 * dominance on the reversed graph, reaching-definition idempotence, and the dependency and loop
 * classifications on small reference programs.
 */

mod dominance_tests;
mod reaching_tests;
