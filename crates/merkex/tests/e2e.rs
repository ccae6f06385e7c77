//! End-to-end flows: object to signed envelope to pipeline verdict.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use merkex::{
    AttestationLocator, AttestationVerifierRegistry, EnvelopeBuilder, ExchangeBuilder,
    ExchangeDocument, MemoryNonceRegistry, SignaturePolicy, TimestampedDocument,
    VerificationPipeline, VerifierRegistry, VerifyStage,
};
use merkex_testkit::{sample_object, CountingAttester, CountingNonceRegistry, SignerFixture};

const MAX_AGE: Duration = Duration::from_secs(3600);

fn locator() -> AttestationLocator {
    AttestationLocator {
        service_id: "EAS".to_string(),
        network: "sepolia".to_string(),
        schema_id: "0x1b".to_string(),
        attestation_id: "0xa11e57".to_string(),
        attester_address: "0x00000000000000000000000000000000000000aa".to_string(),
        recipient_address: "0x00000000000000000000000000000000000000bb".to_string(),
    }
}

#[tokio::test]
async fn test_single_signer_end_to_end() -> Result<()> {
    let fixture = SignerFixture::generate();
    let envelope = ExchangeBuilder::new().seal(&sample_object(), &[&fixture.es256k])?;
    let wire = envelope.to_json()?;

    let pipeline = VerificationPipeline::builder()
        .signature_resolver(Arc::new(fixture.registry()))
        .max_age(MAX_AGE)
        .nonce_registry(Arc::new(MemoryNonceRegistry::new()))
        .build()?;

    let verdict = pipeline.verify(&wire).await;
    assert!(verdict.is_valid, "{}", verdict.message);
    assert_eq!(verdict.stage, VerifyStage::Done);
    assert_eq!(verdict.signature_count, 1);
    assert_eq!(verdict.verified_count, 1);
    assert_eq!(verdict.signers, vec![fixture.es256k.address()]);

    // The document that came back is the one that was sealed
    let document = verdict.document.expect("verdict carries the document");
    document.tree().verify()?;
    assert_eq!(document.tree().reconstruct()?, sample_object());

    // Reparsing the wire form lands on the identical root
    let reparsed = merkex::Envelope::from_json(&wire)?;
    let reparsed_doc = ExchangeDocument::from_payload(&reparsed.payload)?;
    assert_eq!(reparsed_doc.tree().root, document.tree().root);
    Ok(())
}

#[tokio::test]
async fn test_two_signers_require_all_and_require_any() -> Result<()> {
    let fixture = SignerFixture::generate();
    let envelope =
        ExchangeBuilder::new().seal(&sample_object(), &[&fixture.rs256, &fixture.es256k])?;

    // Corrupt the ES256K signature (the second record)
    let mut wire: serde_json::Value = serde_json::from_str(&envelope.to_json()?)?;
    wire["signatures"][1]["signature"] = serde_json::Value::String("A".repeat(86));
    let tampered = wire.to_string();

    let strict = VerificationPipeline::builder()
        .signature_resolver(Arc::new(fixture.registry()))
        .policy(SignaturePolicy::RequireAll)
        .max_age(MAX_AGE)
        .nonce_registry(Arc::new(MemoryNonceRegistry::new()))
        .build()?;
    let verdict = strict.verify(&tampered).await;
    assert!(!verdict.is_valid);
    assert_eq!(verdict.stage, VerifyStage::VerifySignatures);
    assert_eq!(verdict.message, "1 of 2 signatures verified");

    let lenient = VerificationPipeline::builder()
        .signature_resolver(Arc::new(fixture.registry()))
        .policy(SignaturePolicy::RequireAny)
        .max_age(MAX_AGE)
        .nonce_registry(Arc::new(MemoryNonceRegistry::new()))
        .build()?;
    let verdict = lenient.verify(&tampered).await;
    assert!(verdict.is_valid, "{}", verdict.message);
    assert_eq!(verdict.verified_count, 1);

    // The untampered envelope satisfies RequireAll
    let verdict = strict.verify(&envelope.to_json()?).await;
    assert!(verdict.is_valid, "{}", verdict.message);
    assert_eq!(verdict.verified_count, 2);
    Ok(())
}

#[tokio::test]
async fn test_invalid_signature_never_reaches_collaborators() -> Result<()> {
    let fixture = SignerFixture::generate();
    let stranger = SignerFixture::generate();
    let envelope = ExchangeBuilder::new()
        .attestation(locator())
        .seal(&sample_object(), &[&stranger.es256k])?;

    let nonces = Arc::new(CountingNonceRegistry::new());
    let attester = Arc::new(CountingAttester::passing("eas"));
    let pipeline = VerificationPipeline::builder()
        .signature_resolver(Arc::new(fixture.registry()))
        .max_age(MAX_AGE)
        .nonce_registry(nonces.clone())
        .attestation_registry(AttestationVerifierRegistry::new().with(attester.clone()))
        .build()?;

    let verdict = pipeline.verify(&envelope.to_json()?).await;
    assert!(!verdict.is_valid);
    assert_eq!(verdict.stage, VerifyStage::VerifySignatures);
    assert_eq!(nonces.calls(), 0);
    assert_eq!(attester.calls(), 0);
    Ok(())
}

async fn verdict_for_age(offset_from_now: chrono::Duration) -> Result<merkex::ExchangeVerdict> {
    let fixture = SignerFixture::generate();
    let tree = merkex::MerkleTreeBuilder::new().build(&sample_object())?;
    let mut document = TimestampedDocument::new(tree);
    document.timestamp = chrono::Utc::now() + offset_from_now;

    let envelope = EnvelopeBuilder::new(serde_json::to_vec(&document)?)
        .signer(&fixture.es256k)
        .build()?;

    let pipeline = VerificationPipeline::builder()
        .signature_resolver(Arc::new(fixture.registry()))
        .max_age(MAX_AGE)
        .nonce_registry(Arc::new(MemoryNonceRegistry::new()))
        .build()?;
    Ok(pipeline.verify(&envelope.to_json()?).await)
}

#[tokio::test]
async fn test_freshness_window_boundaries() -> Result<()> {
    // Just inside the window
    let verdict = verdict_for_age(-chrono::Duration::seconds(3595)).await?;
    assert!(verdict.is_valid, "{}", verdict.message);

    // Just past the window
    let verdict = verdict_for_age(-chrono::Duration::seconds(3605)).await?;
    assert!(!verdict.is_valid);
    assert_eq!(verdict.stage, VerifyStage::CheckFreshness);
    assert!(verdict.message.contains("expired"));

    // Issued in the future
    let verdict = verdict_for_age(chrono::Duration::seconds(120)).await?;
    assert!(!verdict.is_valid);
    assert_eq!(verdict.stage, VerifyStage::CheckFreshness);
    assert!(verdict.message.contains("future"));
    Ok(())
}

#[tokio::test]
async fn test_attested_end_to_end_and_root_mismatch() -> Result<()> {
    let fixture = SignerFixture::generate();
    let envelope = ExchangeBuilder::new()
        .attestation(locator())
        .seal(&sample_object(), &[&fixture.es256k])?;
    let wire = envelope.to_json()?;

    // Service id resolution is case-insensitive: locator says "EAS",
    // verifier registers "eas"
    let attester = Arc::new(CountingAttester::passing("eas"));
    let pipeline = VerificationPipeline::builder()
        .signature_resolver(Arc::new(fixture.registry()))
        .max_age(MAX_AGE)
        .nonce_registry(Arc::new(MemoryNonceRegistry::new()))
        .attestation_registry(AttestationVerifierRegistry::new().with(attester.clone()))
        .build()?;

    let verdict = pipeline.verify(&wire).await;
    assert!(verdict.is_valid, "{}", verdict.message);
    assert_eq!(attester.calls(), 1);

    // A success report for a different digest is a mismatch, not a pass
    let lying = Arc::new(
        CountingAttester::passing("eas")
            .with_digest(merkex::Sha256Digest::hash(b"someone else's tree")),
    );
    let pipeline = VerificationPipeline::builder()
        .signature_resolver(Arc::new(fixture.registry()))
        .max_age(MAX_AGE)
        .nonce_registry(Arc::new(MemoryNonceRegistry::new()))
        .attestation_registry(AttestationVerifierRegistry::new().with(lying))
        .build()?;

    let envelope = ExchangeBuilder::new()
        .attestation(locator())
        .seal(&sample_object(), &[&fixture.es256k])?;
    let verdict = pipeline.verify(&envelope.to_json()?).await;
    assert!(!verdict.is_valid);
    assert_eq!(verdict.stage, VerifyStage::VerifyAttestation);
    assert!(verdict.message.contains("root mismatch"));
    Ok(())
}

#[tokio::test]
async fn test_redacted_document_still_verifies() -> Result<()> {
    let fixture = SignerFixture::generate();
    let tree = merkex::MerkleTreeBuilder::new().build(&sample_object())?;
    let disclosed = tree.disclose_only(&["name"])?;
    assert_eq!(disclosed.root, tree.root);

    let document = TimestampedDocument::new(disclosed);
    let envelope = EnvelopeBuilder::new(serde_json::to_vec(&document)?)
        .signer(&fixture.es256k)
        .build()?;

    let pipeline = VerificationPipeline::builder()
        .signature_resolver(Arc::new(fixture.registry()))
        .max_age(MAX_AGE)
        .nonce_registry(Arc::new(MemoryNonceRegistry::new()))
        .build()?;

    let verdict = pipeline.verify(&envelope.to_json()?).await;
    assert!(verdict.is_valid, "{}", verdict.message);

    let document = verdict.document.expect("verdict carries the document");
    let revealed = document.tree().reconstruct()?;
    assert_eq!(revealed, serde_json::json!({"name": "John Doe"}));
    Ok(())
}
