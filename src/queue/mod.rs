// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供进程级的采集任务闸门，保证同一时间只运行一个任务
pub mod job_gate;
