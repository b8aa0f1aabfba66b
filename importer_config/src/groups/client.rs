use std::time::Duration;

crate::config_group!({

    /// Base URL of the import server.
    ///
    /// The default value is "http://localhost:8000".
    ///
    /// Use the environment variable `PRODUCT_IMPORTER_CLIENT_ENDPOINT` to set this value.
    ref endpoint : String = "http://localhost:8000".to_string();

    /// Path of the multipart submission endpoint, relative to the endpoint.
    ///
    /// The default value is "/api/upload".
    ///
    /// Use the environment variable `PRODUCT_IMPORTER_CLIENT_UPLOAD_PATH` to set this value.
    ref upload_path : String = "/api/upload".to_string();

    /// Path under which per-job progress streams are served; the job id is appended as the
    /// final path segment.
    ///
    /// The default value is "/api/progress".
    ///
    /// Use the environment variable `PRODUCT_IMPORTER_CLIENT_PROGRESS_PATH` to set this value.
    ref progress_path : String = "/api/progress".to_string();

    /// Maximum time allowed to establish a TCP connection to the server.
    /// This timeout applies only to connection establishment, not to data transfer, so the
    /// long-lived progress stream is not cut off by it.
    ///
    /// The default value is 30 seconds.
    ///
    /// Use the environment variable `PRODUCT_IMPORTER_CLIENT_CONNECT_TIMEOUT` to set this value.
    ref connect_timeout : Duration = Duration::from_secs(30);

    /// Upper bound on the whole upload request, body and response included.
    ///
    /// The default value is 10 minutes.
    ///
    /// Use the environment variable `PRODUCT_IMPORTER_CLIENT_UPLOAD_TIMEOUT` to set this value.
    ref upload_timeout : Duration = Duration::from_secs(10 * 60);

    /// The upload body is handed to the transport in blocks of this many bytes; progress is
    /// reported once per block.
    ///
    /// The default value is 65536.
    ///
    /// Use the environment variable `PRODUCT_IMPORTER_CLIENT_UPLOAD_REPORTING_BLOCK_SIZE` to set this value.
    ref upload_reporting_block_size : usize = 64 * 1024;

    /// User-agent string sent with every request.
    ///
    /// The default value is "product-import".
    ///
    /// Use the environment variable `PRODUCT_IMPORTER_CLIENT_USER_AGENT` to set this value.
    ref user_agent : String = "product-import".to_string();

});
