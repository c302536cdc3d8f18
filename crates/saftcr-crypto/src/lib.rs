//  Copyright (C) 2017-2019  The AXIOM TEAM Association.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Certificate trust/OCSP validation and per-transaction signature chain
//! verification for SAF-T Cash Register audit files.

pub mod certificate;
pub mod message;
pub mod priority;
pub mod signature;

use rsa::RsaPublicKey;

/// Resolves a leaf certificate's public key from its PEM text, used by the
/// Signature Validator to stay independent of how certificates are parsed
/// and cached.
pub trait PublicKeySource {
    fn public_key(&self, cert_pem: &str) -> Option<RsaPublicKey>;
}

impl PublicKeySource for certificate::CertificateCache {
    fn public_key(&self, cert_pem: &str) -> Option<RsaPublicKey> {
        use rsa::pkcs1::DecodeRsaPublicKey;
        use x509_parser::prelude::*;

        let der = certificate::pem_or_der_to_der(cert_pem.as_bytes())?;
        let (_, cert) = X509Certificate::from_der(&der).ok()?;
        let spki_bytes = cert.public_key().subject_public_key.data.as_ref();
        RsaPublicKey::from_pkcs1_der(spki_bytes).ok()
    }
}
