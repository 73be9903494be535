//! RFC 3161 timestamp token verification
//!
//! A token is a DER `ContentInfo` wrapping CMS `SignedData` whose
//! encapsulated content is a `TSTInfo`. Verification reports its checks
//! separately:
//! - message imprint against the expected digest
//! - CMS signature over the signed attributes (or the content itself)
//! - TSA certificate chain with the TimeStamping EKU at the reference time

use crate::asn1::{self, TstInfo};
use crate::error::{Error, Result};
use crate::verifier::{TokenVerification, TokenVerifier};
use chrono::{DateTime, Utc};
use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::{SignedData, SignerIdentifier};
use const_oid::ObjectIdentifier;
use der::{Decode, Encode};
use ers_types::{DigestAlgorithm, DigestValue, TimestampToken};
use rustls_pki_types::{CertificateDer, UnixTime};
use webpki::{anchor_from_trusted_cert, EndEntityCert, KeyUsage, ALL_VERIFICATION_ALGS};
use x509_cert::Certificate;

const ID_KP_TIME_STAMPING: ObjectIdentifier = const_oid::db::rfc5280::ID_KP_TIME_STAMPING;
const ID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");
const OID_MESSAGE_DIGEST: ObjectIdentifier = const_oid::db::rfc6268::ID_MESSAGE_DIGEST;
const OID_SUBJECT_KEY_IDENTIFIER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.14");
const OID_EC_PUBLIC_KEY: ObjectIdentifier = const_oid::db::rfc5912::ID_EC_PUBLIC_KEY;
const OID_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const OID_SECP256R1: ObjectIdentifier = const_oid::db::rfc5912::SECP_256_R_1;
const OID_SECP384R1: ObjectIdentifier = const_oid::db::rfc5912::SECP_384_R_1;

/// Verification options for RFC 3161 timestamp tokens
#[derive(Debug, Clone, Default)]
pub struct VerifyOpts {
    /// Root certificates for chain verification
    pub roots: Vec<CertificateDer<'static>>,

    /// Intermediate certificates for chain building
    pub intermediates: Vec<CertificateDer<'static>>,

    /// TSA certificate, for tokens that do not embed theirs
    pub tsa_certificate: Option<CertificateDer<'static>>,

    /// Period during which the TSA was authorized to issue tokens
    ///
    /// A token generated outside this window is not trusted.
    pub tsa_valid_for: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl VerifyOpts {
    /// Create empty verification options
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root certificate
    pub fn with_root(mut self, root: CertificateDer<'static>) -> Self {
        self.roots.push(root);
        self
    }

    /// Replace the root certificates
    pub fn with_roots(mut self, roots: Vec<CertificateDer<'static>>) -> Self {
        self.roots = roots;
        self
    }

    /// Add an intermediate certificate
    pub fn with_intermediate(mut self, intermediate: CertificateDer<'static>) -> Self {
        self.intermediates.push(intermediate);
        self
    }

    /// Replace the intermediate certificates
    pub fn with_intermediates(mut self, intermediates: Vec<CertificateDer<'static>>) -> Self {
        self.intermediates = intermediates;
        self
    }

    /// Set the TSA certificate
    pub fn with_tsa_certificate(mut self, cert: CertificateDer<'static>) -> Self {
        self.tsa_certificate = Some(cert);
        self
    }

    /// Set the TSA validity period
    pub fn with_tsa_validity(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.tsa_valid_for = Some((start, end));
        self
    }
}

/// [`TokenVerifier`] for RFC 3161 timestamp tokens
#[derive(Debug, Clone, Default)]
pub struct Rfc3161TokenVerifier {
    opts: VerifyOpts,
}

impl Rfc3161TokenVerifier {
    /// Create a verifier with the given trust configuration
    pub fn new(opts: VerifyOpts) -> Self {
        Self { opts }
    }

    /// The trust configuration
    pub fn opts(&self) -> &VerifyOpts {
        &self.opts
    }

    fn check_trust(
        &self,
        signer_cert: &Certificate,
        parsed: &ParsedToken,
        generation_time: Option<DateTime<Utc>>,
        reference_time: DateTime<Utc>,
    ) -> Result<()> {
        if let Some((start, end)) = self.opts.tsa_valid_for {
            let generated = generation_time.ok_or(Error::OutsideValidityPeriod)?;
            if generated < start || generated > end {
                tracing::debug!(
                    "Generation time {} is outside TSA validity period ({} to {})",
                    generated,
                    start,
                    end
                );
                return Err(Error::OutsideValidityPeriod);
            }
        }

        let embedded_certs = extract_certificates(&parsed.signed_data);
        validate_tsa_certificate_chain(signer_cert, reference_time, &self.opts, &embedded_certs)
    }
}

impl TokenVerifier for Rfc3161TokenVerifier {
    fn verify_token(
        &self,
        token: &TimestampToken,
        expected: &DigestValue,
        reference_time: DateTime<Utc>,
    ) -> Result<TokenVerification> {
        tracing::debug!(
            "Verifying RFC 3161 token ({} bytes) against {} at {}",
            token.as_bytes().len(),
            expected,
            reference_time
        );

        let parsed = match ParsedToken::from_der(token.as_bytes()) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("Token could not be parsed: {}", e);
                return Ok(TokenVerification::unprocessed(e.to_string()));
            }
        };

        let mut outcome = TokenVerification {
            processed: true,
            message_imprint_found: true,
            message_imprint_intact: false,
            signature_valid: false,
            certificate_chain_trusted: false,
            generation_time: None,
            failure: None,
        };

        match parsed.tst_info.generation_time() {
            Ok(time) => outcome.generation_time = Some(time),
            Err(e) => outcome.fail(e.to_string()),
        }

        outcome.message_imprint_intact = parsed.tst_info.message_imprint.matches(expected);
        if !outcome.message_imprint_intact {
            let actual = hex::encode(parsed.tst_info.message_imprint.hashed_message.as_bytes());
            outcome.fail(
                Error::HashMismatch {
                    expected: expected.to_string(),
                    actual,
                }
                .to_string(),
            );
        }

        let signer_cert =
            match verify_cms_signature(&parsed.signed_data, &parsed.tst_info_der, &self.opts) {
                Ok(cert) => {
                    outcome.signature_valid = true;
                    Some(cert)
                }
                Err(e) => {
                    tracing::debug!("CMS signature verification failed: {}", e);
                    outcome.fail(e.to_string());
                    None
                }
            };

        if let Some(cert) = signer_cert {
            match self.check_trust(&cert, &parsed, outcome.generation_time, reference_time) {
                Ok(()) => outcome.certificate_chain_trusted = true,
                Err(e) => {
                    tracing::debug!("TSA certificate is not trusted: {}", e);
                    outcome.fail(e.to_string());
                }
            }
        }

        Ok(outcome)
    }
}

/// The decoded layers of a token
struct ParsedToken {
    signed_data: SignedData,
    tst_info: TstInfo,
    tst_info_der: Vec<u8>,
}

impl ParsedToken {
    fn from_der(bytes: &[u8]) -> Result<Self> {
        let content_info = ContentInfo::from_der(bytes)
            .map_err(|e| Error::Parse(format!("failed to decode ContentInfo: {}", e)))?;

        if content_info.content_type != ID_SIGNED_DATA {
            return Err(Error::Parse(format!(
                "ContentInfo content type {} is not SignedData",
                content_info.content_type
            )));
        }

        let signed_data_der = content_info
            .content
            .to_der()
            .map_err(|e| Error::Parse(format!("failed to encode SignedData content: {}", e)))?;
        let signed_data = SignedData::from_der(&signed_data_der)
            .map_err(|e| Error::Parse(format!("failed to decode SignedData: {}", e)))?;

        if signed_data.encap_content_info.econtent_type != asn1::OID_TST_INFO {
            return Err(Error::Parse(
                "encapsulated content type is not TSTInfo".to_string(),
            ));
        }

        // eContent is an OCTET STRING holding the DER TSTInfo
        let tst_info_der = signed_data
            .encap_content_info
            .econtent
            .as_ref()
            .ok_or(Error::NoTstInfo)?
            .value()
            .to_vec();
        let tst_info = TstInfo::from_der_bytes(&tst_info_der)
            .map_err(|e| Error::Parse(format!("failed to decode TSTInfo: {}", e)))?;

        Ok(Self {
            signed_data,
            tst_info,
            tst_info_der,
        })
    }
}

/// Re-encode signed attributes for signature verification.
///
/// RFC 5652: the signed attributes are stored with an [0] IMPLICIT tag in
/// SignerInfo, but the signature covers them encoded as a plain SET OF.
fn signed_attrs_for_verification(attrs: &x509_cert::attr::Attributes) -> Result<Vec<u8>> {
    use der::asn1::SetOfVec;

    let attrs_vec: Vec<x509_cert::attr::Attribute> = attrs.iter().cloned().collect();
    let generic_set = SetOfVec::try_from(attrs_vec).map_err(|e| {
        Error::SignatureVerification(format!("failed to create SetOfVec: {}", e))
    })?;

    generic_set.to_der().map_err(|e| {
        Error::SignatureVerification(format!("failed to re-encode attributes: {}", e))
    })
}

/// Verify the CMS signature and return the signer certificate
fn verify_cms_signature(
    signed_data: &SignedData,
    tst_info_der: &[u8],
    opts: &VerifyOpts,
) -> Result<Certificate> {
    let signer_info = signed_data
        .signer_infos
        .0
        .get(0)
        .ok_or_else(|| Error::SignatureVerification("no signer info found".to_string()))?;

    let mut all_certs = extract_certificates(signed_data);
    if let Some(tsa_cert) = &opts.tsa_certificate {
        if let Ok(cert) = Certificate::from_der(tsa_cert.as_ref()) {
            all_certs.push(cert);
        }
    }

    let signer_cert = find_signer_certificate(&signer_info.sid, &all_certs)?;

    let digest_algorithm = DigestAlgorithm::from_oid(&signer_info.digest_alg.oid.to_string())
        .map_err(|_| Error::UnsupportedAlgorithm(signer_info.digest_alg.oid.to_string()))?;

    // Without signed attributes the signature covers the content directly
    let signed_bytes = match signer_info.signed_attrs.as_ref() {
        Some(signed_attrs) => {
            verify_message_digest_attribute(signed_attrs, tst_info_der, digest_algorithm)?;
            signed_attrs_for_verification(signed_attrs)?
        }
        None => tst_info_der.to_vec(),
    };

    verify_signer_signature(
        signer_info.signature.as_bytes(),
        &signed_bytes,
        &signer_cert,
        digest_algorithm,
    )?;

    Ok(signer_cert)
}

/// Extract certificates from SignedData
fn extract_certificates(signed_data: &SignedData) -> Vec<Certificate> {
    let mut certificates = Vec::new();

    if let Some(cert_set) = &signed_data.certificates {
        for cert_choice in cert_set.0.iter() {
            match cert_choice {
                CertificateChoices::Certificate(cert) => certificates.push(cert.clone()),
                CertificateChoices::Other(_) => {
                    tracing::debug!("Skipping non-standard certificate format");
                }
            }
        }
    }

    certificates
}

/// Find the signer certificate that matches the SignerIdentifier
fn find_signer_certificate(
    signer_id: &SignerIdentifier,
    certificates: &[Certificate],
) -> Result<Certificate> {
    match signer_id {
        SignerIdentifier::IssuerAndSerialNumber(issuer_serial) => certificates
            .iter()
            .find(|cert| {
                cert.tbs_certificate.issuer == issuer_serial.issuer
                    && cert.tbs_certificate.serial_number == issuer_serial.serial_number
            })
            .cloned()
            .ok_or_else(|| {
                Error::SignatureVerification(
                    "no certificate matches issuer and serial number".to_string(),
                )
            }),
        SignerIdentifier::SubjectKeyIdentifier(ski) => certificates
            .iter()
            .find(|cert| {
                cert.tbs_certificate
                    .extensions
                    .iter()
                    .flatten()
                    .filter(|ext| ext.extn_id == OID_SUBJECT_KEY_IDENTIFIER)
                    .filter_map(|ext| {
                        x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(
                            ext.extn_value.as_bytes(),
                        )
                        .ok()
                    })
                    .any(|cert_ski| &cert_ski == ski)
            })
            .cloned()
            .ok_or_else(|| {
                Error::SignatureVerification(
                    "no certificate matches subject key identifier".to_string(),
                )
            }),
    }
}

/// Check that the message-digest attribute is the digest of the TSTInfo
fn verify_message_digest_attribute(
    signed_attrs: &x509_cert::attr::Attributes,
    tst_info_der: &[u8],
    algorithm: DigestAlgorithm,
) -> Result<()> {
    use der::asn1::OctetStringRef;

    let message_digest_attr = signed_attrs
        .iter()
        .find(|attr| attr.oid == OID_MESSAGE_DIGEST)
        .ok_or_else(|| {
            Error::SignatureVerification(
                "message-digest attribute not found in signed attributes".to_string(),
            )
        })?;

    if message_digest_attr.values.len() != 1 {
        return Err(Error::SignatureVerification(
            "message-digest attribute should have exactly one value".to_string(),
        ));
    }

    let message_digest_any = message_digest_attr.values.get(0).ok_or_else(|| {
        Error::SignatureVerification("failed to get message-digest attribute value".to_string())
    })?;
    let message_digest_der = message_digest_any.to_der().map_err(|e| {
        Error::SignatureVerification(format!(
            "failed to encode message-digest attribute value: {}",
            e
        ))
    })?;
    let message_digest = OctetStringRef::from_der(&message_digest_der).map_err(|e| {
        Error::SignatureVerification(format!(
            "failed to decode message-digest as OCTET STRING: {}",
            e
        ))
    })?;

    let content_hash = ers_crypto::digest(algorithm, tst_info_der)?;
    if content_hash.as_bytes() != message_digest.as_bytes() {
        return Err(Error::HashMismatch {
            expected: hex::encode(message_digest.as_bytes()),
            actual: content_hash.to_hex(),
        });
    }

    Ok(())
}

/// Verify the signer's signature with the certificate's public key
///
/// ECDSA on P-256/P-384 and RSA PKCS#1 v1.5 keys are supported.
fn verify_signer_signature(
    signature: &[u8],
    message: &[u8],
    certificate: &Certificate,
    digest_algorithm: DigestAlgorithm,
) -> Result<()> {
    use aws_lc_rs::signature::{
        UnparsedPublicKey, VerificationAlgorithm, ECDSA_P256_SHA256_ASN1, ECDSA_P256_SHA384_ASN1,
        ECDSA_P384_SHA256_ASN1, ECDSA_P384_SHA384_ASN1, RSA_PKCS1_2048_8192_SHA256,
        RSA_PKCS1_2048_8192_SHA384, RSA_PKCS1_2048_8192_SHA512,
    };

    let spki = &certificate.tbs_certificate.subject_public_key_info;
    let public_key_bytes = spki.subject_public_key.as_bytes().ok_or_else(|| {
        Error::SignatureVerification("invalid public key encoding".to_string())
    })?;

    let unsupported = || {
        Error::SignatureVerification(format!(
            "unsupported key/digest combination: {} / {}",
            spki.algorithm.oid, digest_algorithm
        ))
    };

    let algorithm: &'static dyn VerificationAlgorithm = if spki.algorithm.oid == OID_EC_PUBLIC_KEY
    {
        let params = spki.algorithm.parameters.as_ref().ok_or_else(|| {
            Error::SignatureVerification("missing EC curve parameters".to_string())
        })?;
        let curve_oid = params.decode_as::<ObjectIdentifier>().map_err(|e| {
            Error::SignatureVerification(format!("failed to decode curve OID: {}", e))
        })?;

        match (curve_oid, digest_algorithm) {
            (OID_SECP256R1, DigestAlgorithm::Sha256) => &ECDSA_P256_SHA256_ASN1,
            (OID_SECP256R1, DigestAlgorithm::Sha384) => &ECDSA_P256_SHA384_ASN1,
            (OID_SECP384R1, DigestAlgorithm::Sha256) => &ECDSA_P384_SHA256_ASN1,
            (OID_SECP384R1, DigestAlgorithm::Sha384) => &ECDSA_P384_SHA384_ASN1,
            _ => return Err(unsupported()),
        }
    } else if spki.algorithm.oid == OID_RSA_ENCRYPTION {
        match digest_algorithm {
            DigestAlgorithm::Sha256 => &RSA_PKCS1_2048_8192_SHA256,
            DigestAlgorithm::Sha384 => &RSA_PKCS1_2048_8192_SHA384,
            DigestAlgorithm::Sha512 => &RSA_PKCS1_2048_8192_SHA512,
            _ => return Err(unsupported()),
        }
    } else {
        return Err(unsupported());
    };

    UnparsedPublicKey::new(algorithm, public_key_bytes)
        .verify(message, signature)
        .map_err(|_| Error::SignatureVerification("signature verification failed".to_string()))
}

/// Validate the TSA certificate chain at `reference_time`
fn validate_tsa_certificate_chain(
    signer_cert: &Certificate,
    reference_time: DateTime<Utc>,
    opts: &VerifyOpts,
    embedded_certs: &[Certificate],
) -> Result<()> {
    if opts.roots.is_empty() {
        return Err(Error::CertificateValidation(
            "no trusted roots configured".to_string(),
        ));
    }

    let signer_cert_der = signer_cert.to_der().map_err(|e| {
        Error::CertificateValidation(format!("failed to encode signer certificate: {}", e))
    })?;
    let signer_cert_der = CertificateDer::from(signer_cert_der);
    let end_entity_cert = EndEntityCert::try_from(&signer_cert_der).map_err(|e| {
        Error::CertificateValidation(format!("failed to parse end-entity certificate: {}", e))
    })?;

    let trust_anchors = opts
        .roots
        .iter()
        .map(|cert| {
            anchor_from_trusted_cert(cert)
                .map(|anchor| anchor.to_owned())
                .map_err(|e| {
                    Error::CertificateValidation(format!("failed to create trust anchor: {}", e))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut intermediate_ders: Vec<CertificateDer<'static>> = Vec::new();
    for cert in embedded_certs.iter().filter(|cert| *cert != signer_cert) {
        let cert_der = cert.to_der().map_err(|e| {
            Error::CertificateValidation(format!("failed to encode embedded certificate: {}", e))
        })?;
        intermediate_ders.push(CertificateDer::from(cert_der));
    }
    intermediate_ders.extend(opts.intermediates.iter().cloned());

    let seconds = u64::try_from(reference_time.timestamp()).map_err(|_| {
        Error::CertificateValidation(format!("reference time {} predates 1970", reference_time))
    })?;
    let verification_time = UnixTime::since_unix_epoch(std::time::Duration::from_secs(seconds));

    tracing::debug!(
        "Verifying TSA chain with {} intermediate(s) at {}",
        intermediate_ders.len(),
        reference_time
    );

    end_entity_cert
        .verify_for_usage(
            ALL_VERIFICATION_ALGS,
            &trust_anchors,
            &intermediate_ders,
            verification_time,
            KeyUsage::required(ID_KP_TIME_STAMPING.as_bytes()),
            None,
            None,
        )
        .map_err(|e| {
            Error::CertificateValidation(format!("TSA certificate chain validation failed: {}", e))
        })?;

    Ok(())
}
