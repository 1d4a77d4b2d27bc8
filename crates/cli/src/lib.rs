/**
 * On-disk state for the treeseal CLI:
 *  the state directory and its config.toml.
 */
pub mod state;
