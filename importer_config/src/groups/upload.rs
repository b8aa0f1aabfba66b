crate::config_group!({

    /// Only files whose name ends with this extension (compared case-insensitively) are
    /// submitted.
    ///
    /// The default value is ".csv".
    ///
    /// Use the environment variable `PRODUCT_IMPORTER_UPLOAD_ALLOWED_EXTENSION` to set this value.
    ref allowed_extension : String = ".csv".to_string();

    /// Files larger than this are rejected locally instead of being sent to a server that
    /// would refuse them anyway.
    ///
    /// The default value is 524288000 (500 MiB).
    ///
    /// Use the environment variable `PRODUCT_IMPORTER_UPLOAD_MAX_UPLOAD_SIZE` to set this value.
    ref max_upload_size : u64 = 500 * 1024 * 1024;

    /// Name of the multipart form field carrying the file.
    ///
    /// The default value is "file".
    ///
    /// Use the environment variable `PRODUCT_IMPORTER_UPLOAD_FORM_FIELD` to set this value.
    ref form_field : String = "file".to_string();

});
