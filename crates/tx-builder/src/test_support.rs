use spell_package_test_utils::PackageFixture;

use crate::context::SigningContext;

/// A fresh context over the fixture's anchor and funding.
pub(crate) fn context(fixture: &PackageFixture) -> SigningContext {
    SigningContext::new(&fixture.anchor, &fixture.funding, fixture.public_key().into())
        .expect("fixture provenance must resolve")
}

/// A fresh context with the fixture's witnessed commit recorded as prior phase output.
pub(crate) fn context_after_commit(fixture: &PackageFixture) -> SigningContext {
    let mut ctx = context(fixture);
    ctx.record_prior_phase_output(&fixture.witnessed_commit())
        .expect("first record must succeed");
    ctx
}
