//! Certificate Validator: trust-chain lookup, OCSP round-trip, and
//! validity-window checks for every distinct leaf `certificateData`
//! occurrence in a document.

use backoff::exponential::ExponentialBackoff;
use backoff::SystemClock;
use chrono::{NaiveDate, TimeZone, Utc};
use failure::Fail;
use rasn_ocsp::{BasicOcspResponse, CertId, CertStatus, OcspRequest, OcspResponse, Request, TbsRequest};
use rasn_pkix::AlgorithmIdentifier;
use saftcr_model::check::Check;
use saftcr_model::dummy;
use saftcr_model::error_kind::ErrorKind;
use saftcr_model::finding::Finding;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use x509_parser::prelude::*;

/// One occurrence of `certificateData` in the document, with the sibling
/// `transDate` the spec evaluates validity against.
pub struct CertOccurrence<'a> {
    pub cert_pem: Option<&'a str>,
    pub trans_date: Option<NaiveDate>,
    pub source_row: Option<u32>,
    pub audit_trail: Option<String>,
}

/// Errors raised while fetching or parsing certificate material. Never
/// surfaced directly as a finding; the validator degrades each failure
/// into its corresponding `Certificate*` error kind.
#[derive(Debug, Fail)]
pub enum CertificateError {
    #[fail(display = "could not parse leaf certificate")]
    ParseLeaf,
    #[fail(display = "could not resolve or fetch issuer certificate")]
    FetchIssuer,
    #[fail(display = "OCSP round-trip failed")]
    Ocsp,
}

/// Trusted-issuer set, loaded once at startup from every `*.cer` file under
/// a directory.
pub struct TrustedCertificates {
    fingerprints: HashSet<Vec<u8>>,
}

impl TrustedCertificates {
    pub fn load(dir: &Path) -> std::io::Result<Self> {
        let mut fingerprints = HashSet::new();
        if dir.is_dir() {
            for entry in std::fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("cer") {
                    continue;
                }
                let bytes = std::fs::read(&path)?;
                if let Some(der) = pem_or_der_to_der(&bytes) {
                    fingerprints.insert(sha256(&der));
                }
            }
        }
        Ok(TrustedCertificates { fingerprints })
    }

    pub fn trusts(&self, issuer_der: &[u8]) -> bool {
        self.fingerprints.contains(&sha256(issuer_der))
    }
}

pub(crate) fn pem_or_der_to_der(bytes: &[u8]) -> Option<Vec<u8>> {
    if let Ok((_, pem)) = parse_x509_pem(bytes) {
        Some(pem.contents)
    } else if X509Certificate::from_der(bytes).is_ok() {
        Some(bytes.to_vec())
    } else {
        None
    }
}

fn sha256(data: &[u8]) -> Vec<u8> {
    use sha2::{Digest, Sha256};
    Sha256::digest(data).to_vec()
}

/// One leaf certificate's resolved material: its own DER, its issuer's DER
/// (if fetched), and the OCSP outcome (if the round-trip succeeded).
struct LeafRecord {
    der: Vec<u8>,
    issuer_der: Option<Vec<u8>>,
    ocsp: Option<OcspOutcome>,
}

enum OcspOutcome {
    Good,
    Revoked { revocation_time: Option<chrono::NaiveDateTime> },
    Unknown,
}

/// Resolves, fetches, and caches certificate material for one file
/// analysis; also implements [`crate::PublicKeySource`] for the Signature
/// Validator, so a certificate only needs to be parsed once per file.
pub struct CertificateCache {
    client: reqwest::blocking::Client,
    records: std::sync::Mutex<HashMap<String, Option<LeafRecord>>>,
}

impl CertificateCache {
    pub fn new() -> Self {
        CertificateCache {
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(3))
                .build()
                .expect("building the blocking HTTP client with a fixed timeout cannot fail"),
            records: std::sync::Mutex::new(HashMap::new()),
        }
    }

    fn resolve(&self, cert_pem: &str) -> Option<LeafRecord> {
        {
            let cache = self.records.lock().unwrap();
            if let Some(cached) = cache.get(cert_pem) {
                return cached.clone_record();
            }
        }
        let record = match build_leaf_record(&self.client, cert_pem) {
            Ok(r) => Some(r),
            Err(e) => {
                log::debug!("certificate resolution failed: {}", e);
                None
            }
        };
        let mut cache = self.records.lock().unwrap();
        cache.insert(cert_pem.to_string(), record.clone_record());
        record
    }
}

impl Default for CertificateCache {
    fn default() -> Self {
        Self::new()
    }
}

// `LeafRecord` is cheap to re-derive from DER bytes but expensive to
// re-fetch; cache the parsed bytes and re-run `X509Certificate::from_der`
// at each use site instead of trying to store a borrowing parsed value.
trait CloneRecord {
    fn clone_record(&self) -> Option<LeafRecord>;
}
impl CloneRecord for Option<LeafRecord> {
    fn clone_record(&self) -> Option<LeafRecord> {
        self.as_ref().map(|r| LeafRecord {
            der: r.der.clone(),
            issuer_der: r.issuer_der.clone(),
            ocsp: match &r.ocsp {
                Some(OcspOutcome::Good) => Some(OcspOutcome::Good),
                Some(OcspOutcome::Revoked { revocation_time }) => Some(OcspOutcome::Revoked {
                    revocation_time: *revocation_time,
                }),
                Some(OcspOutcome::Unknown) => Some(OcspOutcome::Unknown),
                None => None,
            },
        })
    }
}

fn build_leaf_record(client: &reqwest::blocking::Client, cert_pem: &str) -> Result<LeafRecord, CertificateError> {
    let der = pem_or_der_to_der(cert_pem.as_bytes()).ok_or(CertificateError::ParseLeaf)?;
    let (_, leaf) = X509Certificate::from_der(&der).map_err(|_| CertificateError::ParseLeaf)?;

    let issuer_der = fetch_issuer(client, &leaf).ok();
    let issuer_cert = issuer_der
        .as_deref()
        .and_then(|d| X509Certificate::from_der(d).ok())
        .map(|(_, c)| c);

    let ocsp = run_ocsp(client, &leaf, issuer_cert.as_ref()).ok();

    Ok(LeafRecord { der, issuer_der, ocsp })
}

fn aia_url<'a>(cert: &'a X509Certificate, method_oid: &oid_registry::Oid<'static>) -> Option<&'a str> {
    let aia = cert
        .tbs_certificate
        .extensions()
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::AuthorityInfoAccess(aia) => Some(aia),
            _ => None,
        })?;
    aia.accessdescs
        .iter()
        .find(|desc| &desc.access_method == method_oid)
        .and_then(|desc| match &desc.access_location {
            GeneralName::URI(uri) => Some(*uri),
            _ => None,
        })
}

fn fetch_issuer(client: &reqwest::blocking::Client, leaf: &X509Certificate) -> Result<Vec<u8>, CertificateError> {
    let url = aia_url(leaf, &oid_registry::OID_PKIX_ACCESS_DESCR_CA_ISSUERS).ok_or(CertificateError::FetchIssuer)?;

    // 3 connect retries at a 0.5s exponential backoff factor, per the
    // component design; bounded to a few seconds total so a dead issuer
    // URL cannot stall a whole file's certificate pass.
    let backoff = ExponentialBackoff::<SystemClock> {
        initial_interval: Duration::from_millis(500),
        max_elapsed_time: Some(Duration::from_secs(3)),
        ..Default::default()
    };

    backoff::retry(backoff, || {
        client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map(|b| b.to_vec())
            .map_err(backoff::Error::transient)
    })
    .map_err(|e| {
        log::warn!("fetching issuer certificate from {} failed: {}", url, e);
        CertificateError::FetchIssuer
    })
}

fn run_ocsp(
    client: &reqwest::blocking::Client,
    leaf: &X509Certificate,
    issuer: Option<&X509Certificate>,
) -> Result<OcspOutcome, CertificateError> {
    let issuer = issuer.ok_or(CertificateError::Ocsp)?;
    let ocsp_url = aia_url(leaf, &oid_registry::OID_PKIX_ACCESS_DESCR_OCSP).ok_or(CertificateError::Ocsp)?;

    let req_bytes = build_ocsp_request(leaf, issuer)?;
    let response = client
        .post(ocsp_url)
        .header("Content-Type", "application/ocsp-request")
        .timeout(Duration::from_secs(3))
        .body(req_bytes)
        .send()
        .map_err(|_| CertificateError::Ocsp)?;
    let body = response.bytes().map_err(|_| CertificateError::Ocsp)?;
    decode_ocsp_response(&body)
}

fn build_ocsp_request(leaf: &X509Certificate, issuer: &X509Certificate) -> Result<Vec<u8>, CertificateError> {
    use sha1::{Digest, Sha1};

    let issuer_name_hash = Sha1::digest(issuer.tbs_certificate.subject.as_raw()).to_vec();
    let issuer_key_hash = Sha1::digest(issuer.public_key().subject_public_key.data.as_ref()).to_vec();

    let cert_id = CertId {
        hash_algorithm: AlgorithmIdentifier {
            algorithm: oid_registry::OID_HASH_SHA1.into(),
            parameters: None,
        },
        issuer_name_hash: issuer_name_hash.into(),
        issuer_key_hash: issuer_key_hash.into(),
        serial_number: leaf.tbs_certificate.raw_serial().to_vec().into(),
    };

    let tbs = TbsRequest {
        version: Default::default(),
        requestor_name: None,
        request_list: vec![Request {
            req_cert: cert_id,
            single_request_extensions: None,
        }],
        request_extensions: None,
    };
    let request = OcspRequest {
        tbs_request: tbs,
        optional_signature: None,
    };

    rasn::der::encode(&request).map_err(|_| CertificateError::Ocsp)
}

fn decode_ocsp_response(der: &[u8]) -> Result<OcspOutcome, CertificateError> {
    let response: OcspResponse = rasn::der::decode(der).map_err(|_| CertificateError::Ocsp)?;
    let basic_bytes = response.bytes.as_ref().ok_or(CertificateError::Ocsp)?;
    let basic: BasicOcspResponse = rasn::der::decode(&basic_bytes.response).map_err(|_| CertificateError::Ocsp)?;
    let single = basic
        .tbs_response_data
        .responses
        .get(0)
        .ok_or(CertificateError::Ocsp)?;

    Ok(match &single.cert_status {
        CertStatus::Good => OcspOutcome::Good,
        CertStatus::Revoked(info) => OcspOutcome::Revoked {
            revocation_time: asn1_time_to_naive(&info.revocation_time),
        },
        CertStatus::Unknown(_) => OcspOutcome::Unknown,
    })
}

fn asn1_time_to_naive(time: &rasn::types::GeneralizedTime) -> Option<chrono::NaiveDateTime> {
    Some(time.naive_utc())
}

/// Validate every occurrence against `trust`, using `cache` for the
/// expensive parse/fetch/OCSP work (shared across occurrences pointing at
/// the same leaf PEM text).
pub fn validate(occurrences: &[CertOccurrence], trust: &TrustedCertificates, cache: &CertificateCache) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut any_non_dummy = false;

    for occ in occurrences {
        let cert_pem = match occ.cert_pem {
            Some(c) if !dummy::is_sentinel(c) => c,
            _ => continue,
        };
        any_non_dummy = true;

        let trans_date = match occ.trans_date {
            Some(d) => d,
            None => {
                findings.push(finding(ErrorKind::CertificateCouldNotRun, occ));
                continue;
            }
        };

        let record = match cache.resolve(cert_pem) {
            Some(r) => r,
            None => {
                findings.push(finding(ErrorKind::CertificateCompleteError, occ));
                continue;
            }
        };

        let (_, leaf) = match X509Certificate::from_der(&record.der) {
            Ok(parsed) => parsed,
            Err(_) => {
                findings.push(finding(ErrorKind::CertificateCompleteError, occ));
                continue;
            }
        };

        match &record.ocsp {
            None => findings.push(finding(ErrorKind::CertificateOcspCompleteError, occ)),
            Some(OcspOutcome::Revoked { revocation_time: Some(rev) }) if trans_date > rev.date() => {
                findings.push(finding(ErrorKind::CertificateRevoked, occ));
            }
            Some(OcspOutcome::Unknown) if trans_date <= not_after_date(&leaf) => {
                findings.push(finding(ErrorKind::CertificateUnknown, occ));
            }
            _ => {}
        }

        match &record.issuer_der {
            Some(issuer_der) if trust.trusts(issuer_der) => {}
            _ => findings.push(finding(ErrorKind::CertificateNotTrustedIssuer, occ)),
        }

        if trans_date > not_after_date(&leaf) {
            findings.push(finding(ErrorKind::CertificateExpired, occ));
        }
        if trans_date < not_before_date(&leaf) {
            findings.push(finding(ErrorKind::CertificateNotValidYet, occ));
        }
    }

    if !any_non_dummy {
        findings.push(Finding::error(Check::Certificate, ErrorKind::NoCertificate).with_element_tag("certificateData"));
    }

    findings
}

fn not_after_date(cert: &X509Certificate) -> NaiveDate {
    asn1_to_naive_date(cert.validity().not_after)
}

fn not_before_date(cert: &X509Certificate) -> NaiveDate {
    asn1_to_naive_date(cert.validity().not_before)
}

fn asn1_to_naive_date(t: ASN1Time) -> NaiveDate {
    Utc.timestamp_opt(t.timestamp(), 0)
        .single()
        .map(|dt| dt.date_naive())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
}

fn finding(kind: ErrorKind, occ: &CertOccurrence) -> Finding {
    let mut f = Finding::error(Check::Certificate, kind).with_element_tag("certificateData");
    if let Some(row) = occ.source_row {
        f = f.with_source_row(row);
    }
    if let Some(trail) = &occ.audit_trail {
        f = f.with_audit_trail(trail.clone());
    }
    f
}
