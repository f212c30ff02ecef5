use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

// Headers used by the blob service.
pub const X_MS_DATE: &str = "x-ms-date";
pub const X_MS_VERSION: &str = "x-ms-version";
pub const X_MS_BLOB_TYPE: &str = "x-ms-blob-type";

// Blob REST API version sent with every request.
pub const AZURE_VERSION: &str = "2019-12-12";

/// The fixed container all images live in.
///
/// Container names must be lower case.
pub const DEFAULT_CONTAINER: &str = "foodimages";

// Env values used to supplement configuration.
pub const AZURE_STORAGE_CONNECTION_STRING: &str = "AZURE_STORAGE_CONNECTION_STRING";
pub const AZBLOB_ACCOUNT_NAME: &str = "AZBLOB_ACCOUNT_NAME";
pub const AZBLOB_ACCOUNT_KEY: &str = "AZBLOB_ACCOUNT_KEY";
pub const AZBLOB_ENDPOINT: &str = "AZBLOB_ENDPOINT";
pub const AZBLOB_CONTAINER: &str = "AZBLOB_CONTAINER";

/// Encode set for blob names in URL paths.
///
/// Generated names contain spaces and colons, so everything outside the
/// unreserved set is percent-encoded.
pub const BLOB_NAME_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');
