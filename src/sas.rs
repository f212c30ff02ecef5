use crate::hash;
use crate::time;
use crate::time::DateTime;
use crate::Result;

/// The default parameters that make up a container SAS token
/// https://learn.microsoft.com/en-us/rest/api/storageservices/create-service-sas
const CONTAINER_SAS_VERSION: &str = "2018-11-09";
const CONTAINER_SAS_RESOURCE: &str = "c";
const CONTAINER_SAS_PERMISSIONS: &str = "rwl";

/// A service SAS scoped to a single container.
///
/// The signed policy grants {read, write, list} until `expiry` and carries no
/// start-time restriction: it is valid the instant it is minted. Minting is
/// pure computation; nothing here touches the network.
pub struct ContainerSharedAccessSignature {
    account: String,
    key: String,
    container: String,
    version: String,
    resource: String,
    permissions: String,
    expiry: DateTime,
    start: Option<DateTime>,
    ip: Option<String>,
    protocol: Option<String>,
}

impl ContainerSharedAccessSignature {
    /// Create a SAS token signer with default parameters
    pub fn new(account: String, key: String, container: String, expiry: DateTime) -> Self {
        Self {
            account,
            key,
            container,
            expiry,
            start: None,
            ip: None,
            protocol: None,
            version: CONTAINER_SAS_VERSION.to_string(),
            resource: CONTAINER_SAS_RESOURCE.to_string(),
            permissions: CONTAINER_SAS_PERMISSIONS.to_string(),
        }
    }

    // Azure documentation: https://learn.microsoft.com/en-us/rest/api/storageservices/create-service-sas#construct-the-signature-string
    fn signature(&self) -> Result<String> {
        let canonicalized_resource = format!("/blob/{}/{}", self.account, self.container);

        let string_to_sign = format!(
            "{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}",
            self.permissions,
            self.start
                .as_ref()
                .map_or("".to_string(), |v| time::format_rfc3339(*v)),
            time::format_rfc3339(self.expiry),
            canonicalized_resource,
            "", // signed identifier
            self.ip.clone().unwrap_or_default(),
            self.protocol
                .as_ref()
                .map_or("".to_string(), |v| v.to_string()),
            self.version,
            self.resource,
            "", // signed snapshot time
            "", // rscc
            "", // rscd
            "", // rsce
            "", // rscl
            "", // rsct
        );

        let decode_content = hash::base64_decode(self.key.as_str())?;

        Ok(hash::base64_hmac_sha256(
            &decode_content,
            string_to_sign.as_bytes(),
        ))
    }

    /// Produce the signed query pairs that make up the SAS token.
    ///
    /// [Example](https://docs.microsoft.com/rest/api/storageservices/create-service-sas#service-sas-example) from Azure documentation.
    pub fn token(&self) -> Result<Vec<(String, String)>> {
        let mut elements: Vec<(String, String)> = vec![
            ("sv".to_string(), self.version.to_string()),
            ("sr".to_string(), self.resource.to_string()),
            (
                "se".to_string(),
                urlencoded(time::format_rfc3339(self.expiry)),
            ),
            ("sp".to_string(), self.permissions.to_string()),
        ];

        if let Some(start) = &self.start {
            elements.push(("st".to_string(), urlencoded(time::format_rfc3339(*start))))
        }
        if let Some(ip) = &self.ip {
            elements.push(("sip".to_string(), ip.to_string()))
        }
        if let Some(protocol) = &self.protocol {
            elements.push(("spr".to_string(), protocol.to_string()))
        }

        let sig = ContainerSharedAccessSignature::signature(self)?;
        elements.push(("sig".to_string(), urlencoded(sig)));

        Ok(elements)
    }
}

fn urlencoded(s: String) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn test_time() -> DateTime {
        DateTime::from_str("2022-03-01T08:12:34Z").unwrap()
    }

    #[test]
    fn test_can_generate_sas_token() {
        let key = hash::base64_encode("key".as_bytes());
        let expiry = test_time() + chrono::Duration::minutes(5);
        let sign = ContainerSharedAccessSignature::new(
            "account".to_string(),
            key,
            "foodimages".to_string(),
            expiry,
        );
        let token_content = sign.token().expect("token decode failed");
        let token = token_content
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<String>>()
            .join("&");

        assert_eq!(token, "sv=2018-11-09&sr=c&se=2022-03-01T08%3A17%3A34Z&sp=rwl&sig=mmz7%2BoPAu56xPuohaWBCMNkCfC7pUbQGmE0xoMTCknw%3D");
    }

    #[test]
    fn test_token_has_no_start_restriction() {
        let key = hash::base64_encode("key".as_bytes());
        let sign = ContainerSharedAccessSignature::new(
            "account".to_string(),
            key,
            "foodimages".to_string(),
            test_time(),
        );
        let token = sign.token().unwrap();

        assert!(token.iter().all(|(k, _)| k != "st"));
        assert_eq!(
            token.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            vec!["sv", "sr", "se", "sp", "sig"]
        );
    }
}
