//! End-to-end fixtures driving the full load → heal → structurally repair →
//! extract → value-validate pipeline from real files on disk, the way the
//! CLI itself does via `saftcr_xml::process_file` and `saftcr_rules::validate`.
//!
//! The Certificate and Signature Validators make real network round-trips
//! (AIA issuer fetch, OCSP POST) that this test environment cannot reach, so
//! the pipeline composed here deliberately stops short of
//! `saftcr_cli::engine::analyze_file` and reports only the three checks that
//! are fully resolvable from the file's own bytes: Naming, Structure, Value.
//! The Signature Validator is exercised separately below, directly, since it
//! needs no network access of its own (only a `PublicKeySource`).

use pretty_assertions::assert_eq;
use saftcr_report::aggregate::{self, Prefix};
use saftcr_schema::SchemaIndex;
use saftcr_xml::{naming, process_file, ProcessOutcome};
use std::path::Path;

const OFFLINE_CHECKS: [saftcr_model::Check; 3] =
    [saftcr_model::Check::Naming, saftcr_model::Check::Structure, saftcr_model::Check::Value];

fn schema() -> SchemaIndex {
    SchemaIndex::from_str(SCHEMA).expect("fixture schema parses")
}

fn run_offline(path: &Path, schema: &SchemaIndex) -> aggregate::AggregatedReport {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap();
    let mut findings = Vec::new();
    if let Err(f) = naming::validate(stem) {
        findings.push(f);
    }

    match process_file(path, schema) {
        ProcessOutcome::Unreadable { findings: read_findings } => {
            findings.extend(read_findings);
            aggregate::aggregate_with_checks(findings, &[saftcr_model::Check::Naming])
        }
        ProcessOutcome::Processed(mut parsed) => {
            findings.append(&mut parsed.findings);
            let basics = parsed.model.basics.clone();
            for tran in &mut parsed.model.cash_trans {
                tran.predefined_id = saftcr_rules::basics::predefined_id(&basics, &tran.trans_type).map(str::to_string);
                for raise in &mut tran.raises {
                    raise.predefined_id = saftcr_rules::basics::predefined_id(&basics, &raise.raise_type).map(str::to_string);
                }
            }

            findings.extend(saftcr_rules::validate(
                &parsed.model.basics,
                &parsed.model.articles,
                &parsed.model.events,
                &parsed.model.event_reports,
                &parsed.model.cash_trans,
                true,
            ));

            aggregate::aggregate_with_checks(findings, &OFFLINE_CHECKS)
        }
    }
}

const FILE_STEM: &str = "SAF-T_Cash_Register_12345678_20240102100000_1_2";

const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="auditfile">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="header" type="HeaderType"/>
                <xs:element name="company" type="CompanyType"/>
                <xs:element name="basicsTable" type="BasicsTableType"/>
                <xs:element name="articles" type="ArticlesType"/>
                <xs:element name="cashRegisters" type="CashRegistersType"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>

    <xs:complexType name="HeaderType">
        <xs:sequence>
            <xs:element name="auditFileVersion"/>
            <xs:element name="companyIdent"/>
            <xs:element name="companyName"/>
            <xs:element name="softwareCompanyName"/>
            <xs:element name="softwareDescription"/>
            <xs:element name="softwareVersion"/>
        </xs:sequence>
    </xs:complexType>

    <xs:complexType name="CompanyType">
        <xs:sequence>
            <xs:element name="address" minOccurs="0" maxOccurs="unbounded" type="AddressType"/>
        </xs:sequence>
    </xs:complexType>
    <xs:complexType name="AddressType">
        <xs:sequence>
            <xs:element name="streetName"/>
            <xs:element name="city"/>
            <xs:element name="postalCode"/>
        </xs:sequence>
    </xs:complexType>

    <xs:complexType name="BasicsTableType">
        <xs:sequence>
            <xs:element name="basic" maxOccurs="unbounded" type="BasicType"/>
        </xs:sequence>
    </xs:complexType>
    <xs:complexType name="BasicType">
        <xs:sequence>
            <xs:element name="id"/>
            <xs:element name="desc"/>
            <xs:element name="predefinedBasicID" minOccurs="0"/>
        </xs:sequence>
    </xs:complexType>

    <xs:complexType name="ArticlesType">
        <xs:sequence>
            <xs:element name="article" maxOccurs="unbounded" type="ArticleType"/>
        </xs:sequence>
    </xs:complexType>
    <xs:complexType name="ArticleType">
        <xs:sequence>
            <xs:element name="artID"/>
            <xs:element name="groupID" minOccurs="0"/>
            <xs:element name="desc" minOccurs="0"/>
        </xs:sequence>
    </xs:complexType>

    <xs:complexType name="CashRegistersType">
        <xs:sequence>
            <xs:element name="cashRegister" maxOccurs="unbounded" type="CashRegisterType"/>
        </xs:sequence>
    </xs:complexType>
    <xs:complexType name="CashRegisterType">
        <xs:sequence>
            <xs:element name="registerID"/>
            <xs:element name="eventReports" type="EventReportsType"/>
            <xs:element name="cashTrans" type="CashTransContainerType"/>
        </xs:sequence>
    </xs:complexType>

    <xs:complexType name="EventReportsType">
        <xs:sequence>
            <xs:element name="eventReport" maxOccurs="unbounded" type="EventReportType"/>
        </xs:sequence>
    </xs:complexType>
    <xs:complexType name="EventReportType">
        <xs:sequence>
            <xs:element name="reportID"/>
            <xs:element name="type"/>
            <xs:element name="reportDate"/>
            <xs:element name="totalCashSaleAmnt"/>
            <xs:element name="grandTotalCashSaleAmnt" minOccurs="0"/>
            <xs:element name="tipAmnt" minOccurs="0"/>
        </xs:sequence>
    </xs:complexType>

    <xs:complexType name="CashTransContainerType">
        <xs:sequence>
            <xs:element name="trans" maxOccurs="unbounded" type="TransType"/>
        </xs:sequence>
    </xs:complexType>
    <xs:complexType name="TransType">
        <xs:sequence>
            <xs:element name="nr"/>
            <xs:element name="transID" minOccurs="0"/>
            <xs:element name="transAmntIn"/>
            <xs:element name="transAmntEx"/>
            <xs:element name="transDate"/>
            <xs:element name="transTime"/>
            <xs:element name="empID" minOccurs="0"/>
            <xs:element name="voidTrans" minOccurs="0"/>
            <xs:element name="signature" minOccurs="0"/>
            <xs:element name="certificateData" minOccurs="0"/>
            <xs:element name="ctLines" minOccurs="0" type="CtLinesType"/>
            <xs:element name="payments" minOccurs="0" type="PaymentsType"/>
        </xs:sequence>
    </xs:complexType>

    <xs:complexType name="CtLinesType">
        <xs:sequence><xs:element name="ctLine" maxOccurs="unbounded" type="CtLineType"/></xs:sequence>
    </xs:complexType>
    <xs:complexType name="CtLineType">
        <xs:sequence>
            <xs:element name="artID" minOccurs="0"/>
            <xs:element name="qnt" minOccurs="0"/>
        </xs:sequence>
    </xs:complexType>

    <xs:complexType name="PaymentsType">
        <xs:sequence><xs:element name="payment" maxOccurs="unbounded" type="PaymentType"/></xs:sequence>
    </xs:complexType>
    <xs:complexType name="PaymentType">
        <xs:sequence>
            <xs:element name="amnt" minOccurs="0"/>
        </xs:sequence>
    </xs:complexType>
</xs:schema>"#;

/// One register, one Z report, one fully line-itemed cash sale that
/// reconciles exactly against the report's declared total.
fn clean_document() -> String {
    r#"<auditfile xmlns="urn:StandardAuditFile-Taxation-CashRegister:DK">
  <header>
    <auditFileVersion>1.0</auditFileVersion>
    <companyIdent>12345678</companyIdent>
    <companyName>Test Co</companyName>
    <softwareCompanyName>Acme Software</softwareCompanyName>
    <softwareDescription>Register Suite</softwareDescription>
    <softwareVersion>3.1</softwareVersion>
  </header>
  <company/>
  <basicsTable>
    <basic type="transType"><id>SALE</id><desc>Cash sale</desc><predefinedBasicID>11001</predefinedBasicID></basic>
    <basic type="lineType"><id>L1</id><desc>Regular line</desc><predefinedBasicID>11001</predefinedBasicID></basic>
    <basic type="paymentType"><id>CASH</id><desc>Cash payment</desc><predefinedBasicID>12001</predefinedBasicID></basic>
  </basicsTable>
  <articles>
    <article><artID>A1</artID><desc>Widget</desc></article>
  </articles>
  <cashRegisters>
    <cashRegister>
      <registerID>R1</registerID>
      <eventReports>
        <eventReport>
          <reportID>Z1</reportID>
          <type>Z</type>
          <reportDate>2024-01-02T12:00:00</reportDate>
          <totalCashSaleAmnt>100.00</totalCashSaleAmnt>
        </eventReport>
      </eventReports>
      <cashTrans>
        <trans transType="SALE">
          <nr>1</nr>
          <transAmntIn>100.00</transAmntIn>
          <transAmntEx>80.00</transAmntEx>
          <transDate>2024-01-02T10:00:00</transDate>
          <transTime>10:00:00</transTime>
          <ctLines>
            <ctLine lineType="L1"><artID>A1</artID><qnt>1</qnt></ctLine>
          </ctLines>
          <payments>
            <payment paymentType="CASH"><amnt>100.00</amnt></payment>
          </payments>
        </trans>
      </cashTrans>
    </cashRegister>
  </cashRegisters>
</auditfile>"#
        .to_string()
}

fn write_fixture(dir: &tempfile::TempDir, stem: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(format!("{}.xml", stem));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn clean_file_reports_ok_prefix_for_the_offline_checks() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, FILE_STEM, clean_document().as_bytes());
    let report = run_offline(&path, &schema());
    assert_eq!(report.prefix, Prefix::Ok);
    assert!(report.findings.iter().all(|f| !f.is_error()));
}

#[test]
fn missing_required_child_is_healed_and_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let broken = clean_document().replace("<transDate>2024-01-02T10:00:00</transDate>", "");
    let path = write_fixture(&dir, FILE_STEM, broken.as_bytes());
    let report = run_offline(&path, &schema());
    assert_eq!(report.prefix, Prefix::Nok);
    assert!(report
        .findings
        .iter()
        .any(|f| f.error_kind.code() == "SCHEMAV_ELEMENT_CONTENT"));
}

#[test]
fn out_of_place_duplicate_is_dropped_and_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let broken = clean_document().replace(
        "<companyIdent>12345678</companyIdent>",
        "<companyIdent>12345678</companyIdent><companyIdent>12345678</companyIdent>",
    );
    let path = write_fixture(&dir, FILE_STEM, broken.as_bytes());
    let report = run_offline(&path, &schema());
    assert_eq!(report.prefix, Prefix::Nok);
    assert!(report
        .findings
        .iter()
        .any(|f| f.error_kind.code() == "SCHEMAV_OUT_OF_SEQUENCE"));
}

#[test]
fn value_mismatch_alone_gets_flag_prefix_not_nok() {
    let dir = tempfile::tempdir().unwrap();
    let mismatched = clean_document().replace("<totalCashSaleAmnt>100.00</totalCashSaleAmnt>", "<totalCashSaleAmnt>999.00</totalCashSaleAmnt>");
    let path = write_fixture(&dir, FILE_STEM, mismatched.as_bytes());
    let report = run_offline(&path, &schema());
    assert_eq!(report.prefix, Prefix::Flag);
    assert!(report
        .findings
        .iter()
        .any(|f| matches!(f.error_kind, saftcr_model::ErrorKind::EventReportTotalCashSales { .. })));
    assert!(report.findings.iter().all(|f| f.check != saftcr_model::Check::Structure || !f.is_error()));
}

#[test]
fn non_utf8_bytes_are_healed_to_windows_1252_and_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = clean_document().into_bytes();
    // Splice a raw Windows-1252 byte (0xE6, "æ") into the company name,
    // which is not valid UTF-8 on its own and forces the re-decode path.
    let marker = b"Test Co";
    let pos = bytes.windows(marker.len()).position(|w| w == marker).unwrap();
    bytes.splice(pos..pos + marker.len(), b"Test C\xE6".iter().copied());

    let path = write_fixture(&dir, FILE_STEM, &bytes);
    let report = run_offline(&path, &schema());
    assert_eq!(report.prefix, Prefix::Nok);
    assert!(report
        .findings
        .iter()
        .any(|f| f.error_kind.code() == "XML_FILE_ENCODING_CORRUPT"));
}

#[test]
fn bad_filename_is_reported_alongside_a_clean_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "not_a_valid_name", clean_document().as_bytes());
    let report = run_offline(&path, &schema());
    assert_eq!(report.prefix, Prefix::Nok);
    assert!(report.findings.iter().any(|f| f.check == saftcr_model::Check::Naming && f.is_error()));
}

/// The Signature Validator needs no network access (only a
/// `PublicKeySource`), so its chain-verification logic is exercised
/// directly here with a real RSA keypair/certificate generated offline,
/// rather than through the full file pipeline above.
mod signature_chain {
    use chrono::NaiveDateTime;
    use saftcr_crypto::priority::SignaturePriority;
    use saftcr_crypto::signature;
    use saftcr_crypto::PublicKeySource;
    use saftcr_model::entities::CashTrans;
    use saftcr_model::ErrorKind;
    use std::collections::BTreeMap;

    const CERT_PEM: &str = "-----BEGIN CERTIFICATE-----\n\
MIIDNTCCAh2gAwIBAgIUI33ZWYl4/bRvAuK4HXw5j9OlKNEwDQYJKoZIhvcNAQEL\n\
BQAwKjEWMBQGA1UEAwwNVGVzdCBSZWdpc3RlcjEQMA4GA1UECgwHVGVzdCBDbzAe\n\
Fw0yNjA3MjcwMDM3MTZaFw0zNjA3MjQwMDM3MTZaMCoxFjAUBgNVBAMMDVRlc3Qg\n\
UmVnaXN0ZXIxEDAOBgNVBAoMB1Rlc3QgQ28wggEiMA0GCSqGSIb3DQEBAQUAA4IB\n\
DwAwggEKAoIBAQCYmkuMm3qG08S8B75EL6WC005cian+0V5teLYmqUJPdFwmsKYP\n\
46vvQQLaspHkQYeWWK91lQT6/X64dnXO7KpXrH6meUPXWcdeeKDW1g5oR/i+w34q\n\
vot3Rm9QEGPw0s35w/kPW7TbqUT1Pikqr5HlY8nFxjCYX76+XCXwic+euIeZLtft\n\
0LTUteTT5iERYN2XNjTtzc+2ADL3aLXTAIeDf4tTJ1ZcKXtIMErwozGAr8IFNUio\n\
CvQr37LK7Q7lq537M1g6aLG4QpVSEXU8AQINcqoYMj9oIY3Z2OllkR+PZ5jq3+C4\n\
BcmCSzUUIpBXafLNZnc4s4os9RG0JHUyUaTHAgMBAAGjUzBRMB0GA1UdDgQWBBTC\n\
0xBkUnZWOQ7jX1/EzGVs9cWvXzAfBgNVHSMEGDAWgBTC0xBkUnZWOQ7jX1/EzGVs\n\
9cWvXzAPBgNVHRMBAf8EBTADAQH/MA0GCSqGSIb3DQEBCwUAA4IBAQBWqtxymuZd\n\
zxeY4vs0N3j8C9mnF7MCA4lgjxamVHpkxIrWWaeHQUzZqruuJtXFUoE/XogNXZd7\n\
kLGtf5jyASCholftHUK//SWVhdbpgzXk+61DBmnL6x7Rq+C4IxOWduCg5RSKmB6c\n\
yDvl9QkRZeY7scSVnR4XkK1zOru4zZXnIR8PQRujE2RjUlGzswLjFFTIiNER1zZv\n\
7WjRP2gsE7wK/h7T1S1wIv9efa0Y8c0yOMc13zctARgNGrSxz8wkiViymL+TtPS/\n\
05lOfZEw5/eyP+X5ge6VahCsf4R2U0xCc00yqj+jn9zYbSoeVckmGatA0NbO3mJP\n\
ssRq+uyYdEYc\n\
-----END CERTIFICATE-----\n";

    /// First-in-chain signature; never itself verified against anything.
    const GENESIS_SIGNATURE: &str = "R0VORVNJUw==";
    /// `nr=2`'s signature, produced (by `openssl dgst -sha512 -sign`) over the
    /// message chained correctly from `GENESIS_SIGNATURE`.
    const VALID_CHAIN_SIGNATURE: &str = "E7cUvKzuWQzHMF1nJvibFtF9jUwEEt89GFl263UPvHrA05jc5JfAj5fpOCLxMDcNtgsBaBp4f80SfUywp2QAKSPKiqrKU/V5LmfOZlOkjAZ646vuexfegULCn0j0G+g5io010g2OIAAWeWZkXGK6Jg7otKrf7E2XSC66h4/WFK1YE/PzYUafQyJ3NvpHG4HjAVc5I37MojN/hGmu2fWqzGtnAD1t4nRFDC6IA9zk8FOSAjFxS07kFc72G9eNA9Kq87XoqEptEXDYCfDQTCgaQU2tNf014IZ3Wh5zh6RPhZRHp5u3vPZQB2iAEOPOfhq1pAJHxh1PwO341eGt3mTZWw==";
    /// `nr=2`'s signature when it was actually chained from `"0"` instead of
    /// the real previous signature: a register that silently reset its
    /// chain mid-stream rather than continuing it.
    const BROKEN_CHAIN_SIGNATURE: &str = "OxWyErsTYEr1hLDVhmzLdfzjmSb+1q/pMS5Nr+iuBTtNgnhZIVidR0DqBsJvkfelKZp92IWDtd3mrWFrmUHX4pcpA1QklifnBtcuuawZB1R9JHZV0DBDrAM1bN9yI12zXX4GI22yVvq03FUL7D1rLp6xOq9xkzfcr1ussoVPHT1jB3NaMesziOVACXboOzEYPkTjjsTsgCaZ8kPLeMSK3PFsFR1+cfFYwQ6NbVcTRYIUV6ufJUL3FFTtqYi/e+c9utJwQkBXxkAwBf3G/GaewhOF3w6UHmEgSac5VzODt07gB05JMJeC9aK93G6R4SEDeuC1waIJhI03UiNcpM8EbQ==";

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn tran(nr_raw: &str, trans_id: &str, amnt_in: &str, amnt_ex: &str, time: &str, signature: &str) -> CashTrans {
        CashTrans {
            nr: nr_raw.parse().unwrap(),
            nr_raw: nr_raw.to_string(),
            register_id: "R1".to_string(),
            trans_id: Some(trans_id.to_string()),
            trans_type: "11001".to_string(),
            emp_id: Some("E1".to_string()),
            amnt_incl: amnt_in.parse().unwrap(),
            amnt_excl: amnt_ex.parse().unwrap(),
            amnt_incl_raw: amnt_in.to_string(),
            amnt_excl_raw: amnt_ex.to_string(),
            datetime: dt("2024-01-02T10:00:00"),
            trans_date_raw: "2024-01-02".to_string(),
            trans_time_raw: time.to_string(),
            void_trans: false,
            training_id: None,
            signature: Some(signature.to_string()),
            cert: Some(CERT_PEM.to_string()),
            ct_lines: Vec::new(),
            payments: Vec::new(),
            raises: Vec::new(),
            ref_id: None,
            predefined_id: Some("11001".to_string()),
            source_row: Some(2),
        }
    }

    #[test]
    fn correctly_chained_signature_verifies() {
        let trans1 = tran("1", "T1", "100.00", "80.00", "10:00:00", GENESIS_SIGNATURE);
        let trans2 = tran("2", "T2", "50.00", "40.00", "10:05:00", VALID_CHAIN_SIGNATURE);
        let mut by_register = BTreeMap::new();
        by_register.insert("R1".to_string(), vec![trans1, trans2]);

        let keys = saftcr_crypto::certificate::CertificateCache::new();
        let findings = signature::validate(&by_register, "12345678", &SignaturePriority::new(), &keys);
        assert!(findings.iter().all(|f| !f.is_error()));
    }

    #[test]
    fn chain_reset_to_genesis_is_reported_as_signature_break() {
        let trans1 = tran("1", "T1", "100.00", "80.00", "10:00:00", GENESIS_SIGNATURE);
        let trans2 = tran("2", "T2", "50.00", "40.00", "10:05:00", BROKEN_CHAIN_SIGNATURE);
        let mut by_register = BTreeMap::new();
        by_register.insert("R1".to_string(), vec![trans1, trans2]);

        let keys = saftcr_crypto::certificate::CertificateCache::new();
        let findings = signature::validate(&by_register, "12345678", &SignaturePriority::new(), &keys);
        assert!(findings.iter().any(|f| f.error_kind == ErrorKind::SignatureBreak));
    }
}
