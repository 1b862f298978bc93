/*!
Types shared by the compiler and the matcher: capture group metadata and
match results, small index types and spans.
*/

pub mod captures;
pub mod primitives;
pub mod search;
