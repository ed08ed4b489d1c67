pub(super) mod score;
pub(super) mod share;
pub(super) mod show;
pub(super) mod submit;
pub(super) mod support;
