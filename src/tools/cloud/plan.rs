//! The fixed service/action table and the validation that turns a loose
//! [`CloudRequest`] into a typed [`CloudOperation`].

use chrono::DateTime;
use serde_json::Value as J;

use super::{CloudError, CloudRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    S3,
    Lambda,
    Rds,
    DynamoDb,
    CloudWatchLogs,
}

impl Service {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" => Some(Service::S3),
            "lambda" => Some(Service::Lambda),
            "rds" => Some(Service::Rds),
            "dynamodb" => Some(Service::DynamoDb),
            "cloudwatch_logs" | "logs" => Some(Service::CloudWatchLogs),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Service::S3 => "s3",
            Service::Lambda => "lambda",
            Service::Rds => "rds",
            Service::DynamoDb => "dynamodb",
            Service::CloudWatchLogs => "cloudwatch_logs",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Service::S3 => "S3",
            Service::Lambda => "Lambda",
            Service::Rds => "RDS",
            Service::DynamoDb => "DynamoDB",
            Service::CloudWatchLogs => "CloudWatch Logs",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CloudOperation {
    ListBuckets,
    ListObjects { bucket: String },
    UploadObject { bucket: String, key: String, body: String },
    DeleteObject { bucket: String, key: String },
    CreateBucket { bucket: String },
    DeleteBucket { bucket: String },
    ListFunctions,
    GetFunction { name: String },
    DeleteFunction { name: String },
    InvokeFunction { name: String, payload: J },
    ListDbInstances,
    DescribeDbInstance { id: String },
    DeleteDbInstance { id: String },
    ListTables,
    DescribeTable { table: String },
    PutItem { table: String, item: J },
    GetItem { table: String, key: J },
    DeleteItem { table: String, key: J },
    DescribeLogGroups { limit: Option<u32>, next_token: Option<String> },
    CreateLogGroup { group: String },
    DeleteLogGroup { group: String },
    FilterLogEvents {
        group: String,
        start_ms: Option<i64>,
        end_ms: Option<i64>,
        filter_pattern: Option<String>,
        limit: Option<u32>,
    },
}

impl CloudOperation {
    pub fn service(&self) -> Service {
        use CloudOperation::*;
        match self {
            ListBuckets | ListObjects { .. } | UploadObject { .. } | DeleteObject { .. }
            | CreateBucket { .. } | DeleteBucket { .. } => Service::S3,
            ListFunctions | GetFunction { .. } | DeleteFunction { .. } | InvokeFunction { .. } => {
                Service::Lambda
            }
            ListDbInstances | DescribeDbInstance { .. } | DeleteDbInstance { .. } => Service::Rds,
            ListTables | DescribeTable { .. } | PutItem { .. } | GetItem { .. } | DeleteItem { .. } => {
                Service::DynamoDb
            }
            DescribeLogGroups { .. } | CreateLogGroup { .. } | DeleteLogGroup { .. }
            | FilterLogEvents { .. } => Service::CloudWatchLogs,
        }
    }

    pub fn action(&self) -> &'static str {
        use CloudOperation::*;
        match self {
            ListBuckets => "list_buckets",
            ListObjects { .. } => "list_objects",
            UploadObject { .. } => "upload_object",
            DeleteObject { .. } => "delete_object",
            CreateBucket { .. } => "create_bucket",
            DeleteBucket { .. } => "delete_bucket",
            ListFunctions => "list_functions",
            GetFunction { .. } => "get_function",
            DeleteFunction { .. } => "delete_function",
            InvokeFunction { .. } => "invoke_function",
            ListDbInstances => "list_instances",
            DescribeDbInstance { .. } => "describe_instance",
            DeleteDbInstance { .. } => "delete_instance",
            ListTables => "list_tables",
            DescribeTable { .. } => "describe_table",
            PutItem { .. } => "put_item",
            GetItem { .. } => "get_item",
            DeleteItem { .. } => "delete_item",
            DescribeLogGroups { .. } => "describe_log_groups",
            CreateLogGroup { .. } => "create_log_group",
            DeleteLogGroup { .. } => "delete_log_group",
            FilterLogEvents { .. } => "filter_log_events",
        }
    }
}

/// Validate `req` against the table. Never touches the network.
pub fn plan(req: &CloudRequest) -> Result<CloudOperation, CloudError> {
    let service_raw = present(&req.service).ok_or(CloudError::MissingParameter("service"))?;
    let action_raw = present(&req.action).ok_or(CloudError::MissingParameter("action"))?;
    let service = Service::parse(service_raw)
        .ok_or_else(|| CloudError::UnsupportedService(service_raw.to_string()))?;
    let p = &req.params;
    let action = action_raw.trim().to_ascii_lowercase();

    use CloudOperation::*;
    let op = match (service, action.as_str()) {
        (Service::S3, "list_buckets") => ListBuckets,
        (Service::S3, "list_objects") => ListObjects { bucket: one(&p.bucket_name, "bucket_name")? },
        (Service::S3, "upload_object") => {
            let [bucket, key, body] = all(
                [&p.bucket_name, &p.object_key, &p.file_content],
                ["bucket_name", "object_key", "file_content"],
            )?;
            UploadObject { bucket, key, body }
        }
        (Service::S3, "delete_object") => {
            let [bucket, key] = all([&p.bucket_name, &p.object_key], ["bucket_name", "object_key"])?;
            DeleteObject { bucket, key }
        }
        (Service::S3, "create_bucket") => CreateBucket { bucket: one(&p.bucket_name, "bucket_name")? },
        (Service::S3, "delete_bucket") => DeleteBucket { bucket: one(&p.bucket_name, "bucket_name")? },

        (Service::Lambda, "list_functions") => ListFunctions,
        (Service::Lambda, "get_function") => GetFunction { name: one(&p.function_name, "function_name")? },
        (Service::Lambda, "delete_function") => {
            DeleteFunction { name: one(&p.function_name, "function_name")? }
        }
        (Service::Lambda, "invoke_function") => {
            let name = one(&p.function_name, "function_name")?;
            let payload = match present(&p.file_content) {
                Some(raw) => parse_json("file_content", raw)?,
                None => J::Object(Default::default()),
            };
            InvokeFunction { name, payload }
        }

        (Service::Rds, "list_instances") => ListDbInstances,
        (Service::Rds, "describe_instance") => DescribeDbInstance {
            id: one(&p.db_instance_identifier, "db_instance_identifier")?,
        },
        (Service::Rds, "delete_instance") => DeleteDbInstance {
            id: one(&p.db_instance_identifier, "db_instance_identifier")?,
        },

        (Service::DynamoDb, "list_tables") => ListTables,
        (Service::DynamoDb, "describe_table") => DescribeTable { table: one(&p.table_name, "table_name")? },
        (Service::DynamoDb, "put_item") => {
            let [table, item] = all([&p.table_name, &p.item], ["table_name", "item"])?;
            PutItem { table, item: parse_object("item", &item)? }
        }
        (Service::DynamoDb, "get_item") => {
            let [table, key] = all([&p.table_name, &p.key], ["table_name", "key"])?;
            GetItem { table, key: parse_object("key", &key)? }
        }
        (Service::DynamoDb, "delete_item") => {
            let [table, key] = all([&p.table_name, &p.key], ["table_name", "key"])?;
            DeleteItem { table, key: parse_object("key", &key)? }
        }

        (Service::CloudWatchLogs, "describe_log_groups") => DescribeLogGroups {
            limit: positive(p.limit),
            next_token: present(&p.next_token).map(str::to_string),
        },
        (Service::CloudWatchLogs, "create_log_group") => {
            CreateLogGroup { group: one(&p.log_group_name, "log_group_name")? }
        }
        (Service::CloudWatchLogs, "delete_log_group") => {
            DeleteLogGroup { group: one(&p.log_group_name, "log_group_name")? }
        }
        (Service::CloudWatchLogs, "filter_log_events") => FilterLogEvents {
            group: one(&p.log_group_name, "log_group_name")?,
            start_ms: present(&p.start_time).map(|s| parse_millis("start_time", s)).transpose()?,
            end_ms: present(&p.end_time).map(|s| parse_millis("end_time", s)).transpose()?,
            filter_pattern: present(&p.filter_pattern).map(str::to_string),
            limit: positive(p.limit),
        },

        _ => {
            return Err(CloudError::UnsupportedAction {
                service: service.display_name(),
                action: action_raw.to_string(),
            })
        }
    };
    Ok(op)
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

fn positive(v: Option<u32>) -> Option<u32> {
    v.filter(|n| *n > 0)
}

fn one(v: &Option<String>, name: &'static str) -> Result<String, CloudError> {
    present(v)
        .map(str::to_string)
        .ok_or(CloudError::MissingParameter(name))
}

/// Every listed parameter must be present; the error names the whole set.
fn all<const N: usize>(
    values: [&Option<String>; N],
    names: [&'static str; N],
) -> Result<[String; N], CloudError> {
    if values.iter().any(|v| present(v).is_none()) {
        return Err(CloudError::MissingParameters(names.to_vec()));
    }
    Ok(values.map(|v| v.clone().unwrap_or_default()))
}

fn parse_json(name: &'static str, raw: &str) -> Result<J, CloudError> {
    serde_json::from_str(raw).map_err(|e| CloudError::InvalidParameter {
        name,
        reason: e.to_string(),
    })
}

fn parse_object(name: &'static str, raw: &str) -> Result<J, CloudError> {
    let v = parse_json(name, raw)?;
    if !v.is_object() {
        return Err(CloudError::InvalidParameter {
            name,
            reason: "expected a JSON object".into(),
        });
    }
    Ok(v)
}

/// Epoch milliseconds, or an RFC 3339 timestamp.
fn parse_millis(name: &'static str, raw: &str) -> Result<i64, CloudError> {
    if let Ok(ms) = raw.trim().parse::<i64>() {
        return Ok(ms);
    }
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| CloudError::InvalidParameter {
            name,
            reason: e.to_string(),
        })
}

